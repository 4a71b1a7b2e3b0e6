use crate::GridLimits;

/// Launch grid the kernels are lowered for.
#[derive(Default, Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct GridConfig {
    /// Maximum number of blocks per grid dimension.
    #[serde(default)]
    pub limits: GridLimits,
}

impl GridConfig {
    /// Parse `x,y,z` capacities.
    pub fn parse_limits(value: &str) -> Option<GridLimits> {
        let mut parts = value.split(',').map(|part| part.trim().parse::<u32>());
        let limits = GridLimits {
            x: parts.next()?.ok()?,
            y: parts.next()?.ok()?,
            z: parts.next()?.ok()?,
        };

        match parts.next() {
            Some(_) => None,
            None => Some(limits),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limits_parse_from_three_values() {
        assert_eq!(
            GridConfig::parse_limits("2147483647, 65535,65535"),
            Some(GridLimits::default())
        );
        assert_eq!(GridConfig::parse_limits("1,2"), None);
        assert_eq!(GridConfig::parse_limits("1,2,3,4"), None);
        assert_eq!(GridConfig::parse_limits("a,b,c"), None);
    }
}

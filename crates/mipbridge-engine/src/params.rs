//! Typed parameter table addressed by name.

use serde::Serialize;

use mipbridge_core::config::params;
use mipbridge_core::{EngineError, EngineResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeSelection {
    Dfs,
    #[default]
    BestFirst,
}

impl NodeSelection {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "dfs" => Some(NodeSelection::Dfs),
            "bestfirst" => Some(NodeSelection::BestFirst),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Params {
    pub time_limit: f64,
    pub gap_limit: f64,
    /// Negative means unlimited.
    pub node_limit: i64,
    pub feastol: f64,
    /// Pricing rounds per node; negative means unlimited.
    pub max_pricing_rounds: i64,
    pub verbosity: i64,
    pub check_stability: bool,
    pub node_selection: NodeSelection,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            time_limit: f64::INFINITY,
            gap_limit: 0.0,
            node_limit: -1,
            feastol: 1e-6,
            max_pricing_rounds: -1,
            verbosity: 0,
            check_stability: false,
            node_selection: NodeSelection::default(),
        }
    }
}

fn invalid(name: &str, value: impl ToString) -> EngineError {
    EngineError::InvalidParameterValue {
        name: name.to_string(),
        value: value.to_string(),
    }
}

fn expects(name: &str, expected: &'static str) -> EngineError {
    EngineError::ParameterType {
        name: name.to_string(),
        expected,
    }
}

fn kind_of(name: &str) -> Option<&'static str> {
    match name {
        params::TIME_LIMIT | params::GAP_LIMIT | params::FEASTOL => Some("real"),
        params::NODE_LIMIT | params::MAX_PRICING_ROUNDS | params::VERBOSITY => Some("int"),
        params::CHECK_STABILITY => Some("bool"),
        params::NODE_SELECTION => Some("string"),
        _ => None,
    }
}

impl Params {
    fn mismatch(name: &str) -> EngineError {
        match kind_of(name) {
            Some(kind) => expects(name, kind),
            None => EngineError::UnknownParameter(name.to_string()),
        }
    }

    pub fn set_int(&mut self, name: &str, value: i64) -> EngineResult<()> {
        match name {
            params::NODE_LIMIT => self.node_limit = value,
            params::MAX_PRICING_ROUNDS => self.max_pricing_rounds = value,
            params::VERBOSITY => {
                if !(0..=5).contains(&value) {
                    return Err(invalid(name, value));
                }
                self.verbosity = value;
            }
            _ => return Err(Self::mismatch(name)),
        }
        Ok(())
    }

    pub fn set_real(&mut self, name: &str, value: f64) -> EngineResult<()> {
        if value.is_nan() {
            return Err(invalid(name, value));
        }
        match name {
            params::TIME_LIMIT if value >= 0.0 => self.time_limit = value,
            params::GAP_LIMIT if value >= 0.0 => self.gap_limit = value,
            params::FEASTOL if value > 0.0 && value <= 0.1 => self.feastol = value,
            params::TIME_LIMIT | params::GAP_LIMIT | params::FEASTOL => {
                return Err(invalid(name, value))
            }
            _ => return Err(Self::mismatch(name)),
        }
        Ok(())
    }

    pub fn set_bool(&mut self, name: &str, value: bool) -> EngineResult<()> {
        match name {
            params::CHECK_STABILITY => self.check_stability = value,
            _ => return Err(Self::mismatch(name)),
        }
        Ok(())
    }

    pub fn set_string(&mut self, name: &str, value: &str) -> EngineResult<()> {
        match name {
            params::NODE_SELECTION => {
                self.node_selection = NodeSelection::parse(value).ok_or_else(|| invalid(name, value))?;
            }
            _ => return Err(Self::mismatch(name)),
        }
        Ok(())
    }

    pub fn node_limit(&self) -> Option<u64> {
        u64::try_from(self.node_limit).ok()
    }

    pub fn max_pricing_rounds(&self) -> Option<u64> {
        u64::try_from(self.max_pricing_rounds).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_unlimited() {
        let table = Params::default();
        assert!(table.time_limit.is_infinite());
        assert_eq!(table.node_limit(), None);
        assert_eq!(table.max_pricing_rounds(), None);
        assert_eq!(table.node_selection, NodeSelection::BestFirst);
    }

    #[test]
    fn test_typed_setters() {
        let mut table = Params::default();
        table.set_real(params::TIME_LIMIT, 5.0).unwrap();
        table.set_int(params::NODE_LIMIT, 10).unwrap();
        table.set_bool(params::CHECK_STABILITY, true).unwrap();
        table.set_string(params::NODE_SELECTION, "dfs").unwrap();
        assert_eq!(table.time_limit, 5.0);
        assert_eq!(table.node_limit(), Some(10));
        assert!(table.check_stability);
        assert_eq!(table.node_selection, NodeSelection::Dfs);
    }

    #[test]
    fn test_wrong_type_and_unknown_name() {
        let mut table = Params::default();
        assert!(matches!(
            table.set_int(params::TIME_LIMIT, 5),
            Err(EngineError::ParameterType { expected: "real", .. })
        ));
        assert!(matches!(
            table.set_real("limits/bogus", 1.0),
            Err(EngineError::UnknownParameter(_))
        ));
    }

    #[test]
    fn test_out_of_range_values() {
        let mut table = Params::default();
        assert!(table.set_real(params::GAP_LIMIT, -0.1).is_err());
        assert!(table.set_real(params::FEASTOL, 0.0).is_err());
        assert!(table.set_int(params::VERBOSITY, 9).is_err());
        assert!(table.set_string(params::NODE_SELECTION, "random").is_err());
        assert_eq!(table, Params::default());
    }
}

//! Engine configuration and the host-supplied monotonic clock abstraction.

use crate::error::FollowError;

/// Which recurrence the `MatchMatrix` runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Static,
    Dynamic,
}

impl Strategy {
    pub fn parse(tag: &str) -> Result<Strategy, FollowError> {
        match tag {
            "static" => Ok(Strategy::Static),
            "dynamic" => Ok(Strategy::Dynamic),
            other => Err(FollowError::StrategyUnknown(other.to_string())),
        }
    }
}

/// Validated, `Copy` configuration bundling every tunable constant named in
/// the recurrence. Construction rejects out-of-range values so bad
/// configuration is caught at startup rather than mid-stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Parameters {
    pub strategy: Strategy,

    /// Half-width of the sliding window over score rows. Default 10.
    pub win_half_len: usize,

    /// Static: cost of skipping a score event (`V`). Default 1.
    pub scm: i32,
    /// Static: cost of skipping a performance note (`H`). Default 0.
    pub sce: i32,
    /// Static: mismatch penalty on the diagonal. Default 1.
    pub scw: i32,

    /// Dynamic: per-unused-pitch penalty on the vertical rule. Default 2.
    pub dcm: i32,
    /// Dynamic: reward for a chord/trill hit. Default 2.
    pub dmc: i32,
    /// Dynamic: cost of a non-match / beyond-grace horizontal step. Default 1.
    pub dce: i32,
    /// Dynamic: reward for an in-order grace hit. Default 1.
    pub dgc: i32,

    /// Maximum IOI, in seconds, for a grace hit to still count. Default 0.1.
    pub grace_max_ioi: f64,
    /// Maximum IOI, in seconds, for a trill repeat to still count. Default 0.2.
    pub trill_max_ioi: f64,

    /// Maximum gap, in seconds, between performance notes grouped into one
    /// performance compound event under the static strategy. Default 0.075.
    pub epsilon: f64,

    /// Slack subtracted from `top_score` when deciding whether a row still
    /// counts as a reportable improvement; a row that only ties `top_score`
    /// (common when a skip penalty exactly cancels a fresh match reward)
    /// still reports. Default 0.
    pub confidence_slack: i32,

    /// Dynamic: how many rows ahead of the current best match the window
    /// center leads, when re-centering before each note. Default 1.
    pub dynamic_lead: usize,
}

impl Default for Parameters {
    fn default() -> Self {
        Parameters {
            strategy: Strategy::Static,
            win_half_len: 10,
            scm: 1,
            sce: 0,
            scw: 1,
            dcm: 2,
            dmc: 2,
            dce: 1,
            dgc: 1,
            grace_max_ioi: 0.1,
            trill_max_ioi: 0.2,
            epsilon: 0.075,
            confidence_slack: 0,
            dynamic_lead: 1,
        }
    }
}

impl Parameters {
    /// Validates range invariants. Called once at construction time; `feed`
    /// never re-validates.
    pub fn validate(self) -> Result<Self, FollowError> {
        if self.win_half_len < 1 {
            return Err(FollowError::InvariantViolated(
                "win_half_len must be >= 1".into(),
            ));
        }
        if self.grace_max_ioi < 0.0 {
            return Err(FollowError::InvariantViolated(
                "grace_max_ioi must be >= 0".into(),
            ));
        }
        if self.trill_max_ioi < 0.0 {
            return Err(FollowError::InvariantViolated(
                "trill_max_ioi must be >= 0".into(),
            ));
        }
        if self.epsilon < 0.0 {
            return Err(FollowError::InvariantViolated(
                "epsilon must be >= 0".into(),
            ));
        }
        if self.confidence_slack < 0 {
            return Err(FollowError::InvariantViolated(
                "confidence_slack must be >= 0".into(),
            ));
        }
        Ok(self)
    }
}

/// A monotonic time source a host may implement to share a single clock
/// abstraction between the accompanist and the follower. The engine itself
/// never reads wall-clock time: every `feed` call receives `perf_time`
/// explicitly from the caller.
pub trait Clock {
    fn now(&self) -> f64;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_parameters_validate() {
        assert!(Parameters::default().validate().is_ok());
    }

    #[test]
    fn rejects_zero_win_half_len() {
        let p = Parameters {
            win_half_len: 0,
            ..Parameters::default()
        };
        assert!(p.validate().is_err());
    }

    #[test]
    fn parses_strategy_tags() {
        assert_eq!(Strategy::parse("static"), Ok(Strategy::Static));
        assert_eq!(Strategy::parse("dynamic"), Ok(Strategy::Dynamic));
        assert!(Strategy::parse("quantum").is_err());
    }
}

use thiserror::Error;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while configuring, seeding or stepping a simulation.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid domain, particle, material or schedule parameter. Raised before any stepping.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The initializer exhausted its retry ceiling for one particle.
    #[error("placement infeasible: placed {placed} of {requested} particles, gave up after {attempts} attempts")]
    PlacementInfeasible {
        placed: usize,
        requested: usize,
        attempts: usize,
    },

    /// A particle left the finite range (only reported when finite checks are enabled).
    #[error("numerical divergence at step {step}: particle {id} has a non-finite position or velocity")]
    NumericalDivergence { step: usize, id: usize },

    /// Operation not allowed in the current lifecycle state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placement_message_names_counts() {
        let e = Error::PlacementInfeasible {
            placed: 3,
            requested: 10,
            attempts: 500,
        };
        let msg = e.to_string();
        assert!(msg.contains("3 of 10"));
        assert!(msg.contains("500"));
    }
}

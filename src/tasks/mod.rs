/// Bundle submission task
pub mod submit;

/// Block watching task
pub mod watch;

mod bootstrap;
pub(crate) mod gameplay;
mod loop_runner;

pub(crate) use loop_runner::run;

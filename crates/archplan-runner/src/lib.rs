mod cli;
mod config;
mod run;

pub use cli::{Cli, Commands, OutputFormat, PlanCommand, PlanFileArgs, RunArgs};
pub use config::{
    load_runner_config, load_runner_config_or_default, validate_runner_config, RunnerConfig,
    RunnerConfigError, RUNNER_CONFIG_SCHEMA,
};
pub use run::{execute_plan_order, execute_plan_validate, execute_run, RunnerError};

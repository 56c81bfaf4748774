use archplan_runner::{
    execute_plan_order, execute_plan_validate, execute_run, Cli, Commands, PlanCommand,
};
use clap::Parser;

fn main() {
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Plan(plan_command) => match plan_command {
            PlanCommand::Validate(args) => execute_plan_validate(&args),
            PlanCommand::Order(args) => execute_plan_order(&args),
        },
        Commands::Run(args) => execute_run(&args),
    };

    match result {
        Ok(output) => {
            println!("{output}");
        }
        Err(error) => {
            eprintln!("{error}");
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;

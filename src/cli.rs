use clap::{Args, Parser, Subcommand};
use std::net::{IpAddr, SocketAddr};

use crate::api::ProjectResponse;
use crate::core::{ProjectionError, ProjectionInput, YearRecord, project};

#[derive(Parser, Debug)]
#[command(
    name = "savings-projection",
    about = "Year-by-year savings projection through accumulation and retirement withdrawals"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the calculator page and JSON API
    Serve(ServeArgs),
    /// Run a single projection and print it
    Project(ProjectArgs),
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    #[arg(long, env = "BIND_ADDRESS", default_value = "0.0.0.0")]
    pub bind: IpAddr,
    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,
}

impl ServeArgs {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }
}

#[derive(Args, Debug, Clone)]
pub struct ProjectArgs {
    #[arg(long, allow_negative_numbers = true)]
    pub current_age: i64,
    #[arg(long, allow_negative_numbers = true)]
    pub retirement_age: i64,
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub initial_amount: f64,
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub monthly_contribution: f64,
    #[arg(
        long,
        default_value_t = 0.0,
        allow_negative_numbers = true,
        help = "Expected annual return in percent, e.g. 5"
    )]
    pub interest_rate: f64,
    #[arg(
        long,
        default_value_t = 0.0,
        allow_negative_numbers = true,
        help = "Annual inflation in percent"
    )]
    pub inflation_rate: f64,
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub monthly_withdrawal: f64,
    #[arg(
        long,
        default_value_t = 0.0,
        allow_negative_numbers = true,
        help = "Annual growth of the monthly contribution in percent (e.g. pay rises)"
    )]
    pub contribution_increase: f64,
    #[arg(long, default_value = "", help = "Label printed next to amounts")]
    pub currency: String,
    #[arg(long, help = "Print the API response body instead of a table")]
    pub json: bool,
}

impl From<&ProjectArgs> for ProjectionInput {
    fn from(args: &ProjectArgs) -> Self {
        ProjectionInput {
            currency: args.currency.clone(),
            initial_amount: args.initial_amount,
            monthly_contribution: args.monthly_contribution,
            interest_rate: args.interest_rate,
            inflation_rate: args.inflation_rate,
            current_age: args.current_age,
            retirement_age: args.retirement_age,
            monthly_withdrawal: args.monthly_withdrawal,
            contribution_growth_rate: args.contribution_increase,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Projection(#[from] ProjectionError),

    #[error("failed to encode projection: {0}")]
    Encode(#[from] serde_json::Error),
}

pub fn run_project(args: &ProjectArgs) -> Result<String, CliError> {
    let input = ProjectionInput::from(args);
    let records = project(&input)?;
    tracing::debug!(rows = records.len(), "projection complete");

    if args.json {
        let response = ProjectResponse::new(input.currency, records);
        Ok(format!("{}\n", serde_json::to_string_pretty(&response)?))
    } else {
        Ok(render_table(&records, &input.currency))
    }
}

pub fn render_table(records: &[YearRecord], currency: &str) -> String {
    let unit = if currency.is_empty() {
        String::new()
    } else {
        format!(" ({currency})")
    };

    let mut out = format!(
        "{:>5}  {:>18}  {:>18}  {:>18}\n",
        "Age",
        format!("Invested{unit}"),
        format!("Savings{unit}"),
        format!("Withdrawal{unit}"),
    );
    for record in records {
        match (record.age, &record.note) {
            (Some(age), _) => out.push_str(&format!(
                "{:>5}  {:>18}  {:>18}  {:>18}\n",
                age, record.total_invested, record.total_savings, record.withdrawal
            )),
            (None, Some(note)) => out.push_str(&format!("\n{note}\n")),
            (None, None) => {}
        }
    }
    out
}

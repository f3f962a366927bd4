use std::{fs::File, io::Write, path::Path};

use anyhow::{anyhow, Context};
use clap::{command, Args, Parser, Subcommand};
use enum_dispatch::enum_dispatch;
use h2latam::{
    config::Config,
    formatters::{CSVFormatter, GeoJSONFormatter, JSONFormatter, OutputFormatter, OutputGenerator},
    units::CapacityUnit,
    views::{ChartKind, UnitSelection, View},
    Dashboard,
};
use log::{debug, info};
use polars::frame::DataFrame;
use serde::{Deserialize, Serialize};
use spinners::{Spinner, Spinners};
use strum::IntoEnumIterator;
use strum_macros::EnumString;

use crate::display::{render_kpis, render_view, render_view_list};
use crate::error::H2CliResult;

const DEFAULT_PROGRESS_SPINNER: Spinners = Spinners::Dots;
const COMPLETE_PROGRESS_STRING: &str = "✔";
const RUNNING_TAIL_STRING: &str = "...";
const LOADING_STRING: &str = "Loading facility data";

/// Defines the output formats a view can be produced in.
#[derive(Clone, Debug, Deserialize, Serialize, EnumString, PartialEq, Eq)]
#[strum(ascii_case_insensitive)]
pub enum OutputFormat {
    Table,
    Csv,
    Json,
    GeoJSON,
}

impl OutputFormat {
    /// The formatter for machine-readable formats, `None` for terminal tables.
    fn formatter(&self) -> Option<OutputFormatter> {
        match self {
            OutputFormat::Table => None,
            OutputFormat::Csv => Some(OutputFormatter::Csv(CSVFormatter)),
            OutputFormat::Json => Some(OutputFormatter::Json(JSONFormatter)),
            OutputFormat::GeoJSON => Some(OutputFormatter::GeoJSON(GeoJSONFormatter)),
        }
    }
}

fn write_output<T, U>(
    output_generator: T,
    mut data: DataFrame,
    output_file: Option<U>,
) -> H2CliResult<()>
where
    T: OutputGenerator,
    U: AsRef<Path>,
{
    if let Some(output_file) = output_file {
        let mut f = File::create(output_file).context("Failed to write output")?;
        output_generator.save(&mut f, &mut data)?;
    } else {
        let mut stdout_lock = std::io::stdout().lock();
        output_generator.save(&mut stdout_lock, &mut data)?;
    };
    Ok(())
}

fn write_text<U: AsRef<Path>>(text: &str, output_file: Option<U>) -> H2CliResult<()> {
    if let Some(output_file) = output_file {
        let mut f = File::create(output_file).context("Failed to write output")?;
        writeln!(f, "{text}")?;
    } else {
        println!("{text}");
    }
    Ok(())
}

/// Load the dashboard, with a spinner unless `quiet`.
fn load_dashboard(config: Config, quiet: bool) -> H2CliResult<Dashboard> {
    let sp = (!quiet).then(|| {
        Spinner::with_timer(
            DEFAULT_PROGRESS_SPINNER,
            LOADING_STRING.to_string() + RUNNING_TAIL_STRING,
        )
    });
    let dashboard = Dashboard::new_with_config(config);
    if let Some(mut s) = sp {
        s.stop_with_symbol(COMPLETE_PROGRESS_STRING);
    }
    Ok(dashboard?)
}

/// Trait that defines what to run when a given subcommand is invoked.
#[enum_dispatch]
pub trait RunCommand {
    fn run(&self, config: Config) -> H2CliResult<()>;
}

#[derive(Debug, Clone, clap::ValueEnum, Copy)]
enum UnitArg {
    Nm3,
    Mw,
}

impl From<UnitArg> for CapacityUnit {
    fn from(value: UnitArg) -> Self {
        match value {
            UnitArg::Nm3 => CapacityUnit::Nm3PerYear,
            UnitArg::Mw => CapacityUnit::Megawatt,
        }
    }
}

/// Unit toggles for the two production metrics.
#[derive(Args, Debug, Clone)]
struct UnitArgs {
    #[arg(
        value_enum,
        long,
        help = "Unit for the world production metric",
        default_value_t = UnitArg::Nm3
    )]
    world_unit: UnitArg,
    #[arg(
        value_enum,
        long,
        help = "Unit for the LATAM production metric",
        default_value_t = UnitArg::Nm3
    )]
    latam_unit: UnitArg,
}

impl From<&UnitArgs> for UnitSelection {
    fn from(value: &UnitArgs) -> Self {
        Self {
            world: value.world_unit.into(),
            latam: value.latam_unit.into(),
        }
    }
}

/// The `metrics` command prints the headline production and CO₂ figures.
#[derive(Args, Debug)]
pub struct MetricsCommand {
    #[command(flatten)]
    units: UnitArgs,
    #[arg(from_global)]
    quiet: bool,
}

impl RunCommand for MetricsCommand {
    fn run(&self, config: Config) -> H2CliResult<()> {
        info!("Running `metrics` subcommand");
        let dashboard = load_dashboard(config, self.quiet)?;
        let kpis = dashboard.kpis((&self.units).into())?;
        println!("\n{}", render_kpis(&kpis));
        Ok(())
    }
}

/// The `view` command outputs a single dashboard view as a table or in a machine-readable format.
#[derive(Args, Debug)]
pub struct ViewCommand {
    #[arg(index = 1, help = "Name of the view, as listed by the `views` command")]
    view: View,
    #[arg(
        short = 'f',
        long,
        value_name = "table|csv|json|geojson",
        default_value = "table",
        help = "Output format for the view"
    )]
    output_format: OutputFormat,
    #[arg(short = 'o', long, help = "Output file to place the results")]
    output_file: Option<String>,
    #[arg(from_global)]
    quiet: bool,
}

impl RunCommand for ViewCommand {
    fn run(&self, config: Config) -> H2CliResult<()> {
        info!("Running `view` subcommand");
        if self.output_format == OutputFormat::GeoJSON && self.view.chart_kind() != ChartKind::Map {
            return Err(anyhow!(
                "GeoJSON output is only available for the map view ({})",
                View::LatamMap
            )
            .into());
        }
        // Keep stdout clean when it carries machine-readable output
        let quiet = self.quiet
            || (self.output_format != OutputFormat::Table && self.output_file.is_none());
        let dashboard = load_dashboard(config, quiet)?;
        let data = dashboard.view(self.view)?;
        debug!("{:#?}", data.frame);
        match self.output_format.formatter() {
            Some(formatter) => write_output(formatter, data.frame, self.output_file.as_deref()),
            None => write_text(&render_view(&data)?, self.output_file.as_deref()),
        }
    }
}

/// The `views` command lists the available views.
#[derive(Args, Debug)]
pub struct ViewsCommand {}

impl RunCommand for ViewsCommand {
    fn run(&self, _config: Config) -> H2CliResult<()> {
        println!("\n{}", render_view_list());
        Ok(())
    }
}

/// The `dashboard` command prints the metrics followed by every view.
#[derive(Args, Debug)]
pub struct DashboardCommand {
    #[command(flatten)]
    units: UnitArgs,
    #[arg(from_global)]
    quiet: bool,
}

impl RunCommand for DashboardCommand {
    fn run(&self, config: Config) -> H2CliResult<()> {
        info!("Running `dashboard` subcommand");
        let dashboard = load_dashboard(config, self.quiet)?;
        let kpis = dashboard.kpis((&self.units).into())?;
        println!("\n{}", render_kpis(&kpis));
        for view in View::iter() {
            let data = dashboard.view(view)?;
            println!("\n{}", render_view(&data)?);
        }
        Ok(())
    }
}

/// Command line interface for the hydrogen facility dashboard
#[derive(Parser, Debug)]
#[command(version, about, long_about = None, name = "h2latam")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
    #[arg(
        long = "data",
        value_name = "PATH",
        help = "Facility table to load (.xlsx, .xls, .ods, .csv or .parquet); overrides the config file",
        global = true
    )]
    data_path: Option<String>,
    #[arg(
        long,
        help = "Worksheet to read from a spreadsheet; the first sheet when unset",
        global = true
    )]
    sheet: Option<String>,
    #[arg(
        short = 'q',
        long = "quiet",
        help = "Do not print the progress spinner to stdout. Results and logs (when `RUST_LOG` is set) will still be printed.",
        global = true
    )]
    quiet: bool,
}

impl Cli {
    /// Apply command line overrides on top of the file configuration.
    pub fn apply_overrides(&self, mut config: Config) -> Config {
        if let Some(data_path) = &self.data_path {
            config.data_path.clone_from(data_path);
        }
        if let Some(sheet) = &self.sheet {
            config.sheet = Some(sheet.clone());
        }
        config
    }
}

/// Commands contains the list of subcommands avaliable for use in the CLI.
/// Each command should implement the RunCommand trait and specify the list
/// of required args for that command.
#[derive(Subcommand, Debug)]
#[enum_dispatch(RunCommand)]
pub enum Commands {
    /// Headline production and CO₂ metrics
    Metrics(MetricsCommand),
    /// Output a single view
    View(ViewCommand),
    /// List the available views
    Views(ViewsCommand),
    /// Print the metrics and every view
    Dashboard(DashboardCommand),
}

//! Dashboard entry point — CLI wiring, feed loading, and forecast printing.

use std::path::Path;
use std::process;

use chrono::NaiveDateTime;

use powerdash::config::DashboardConfig;
use powerdash::feed::{self, TelemetrySample, Vehicle};
use powerdash::forecast::{ChargingOverride, ForecastEngine, ForecastSeries};
use powerdash::io::export::export_csv;
use powerdash::status::DashboardStatus;
use powerdash::synth::synthetic_feed;
use powerdash::units::{charger_power_kw, format_hours_hm, hours_to_percent};

/// Parsed CLI arguments.
struct CliArgs {
    feed_path: Option<String>,
    demo: bool,
    seed: u64,
    config_path: Option<String>,
    at: Option<NaiveDateTime>,
    model3_amps: Option<u32>,
    modelx_amps: Option<u32>,
    csv_out: Option<String>,
    #[cfg(feature = "api")]
    serve: bool,
    #[cfg(feature = "api")]
    port: u16,
}

fn print_help() {
    eprintln!("powerdash — home battery and EV forecast dashboard");
    eprintln!();
    eprintln!("Usage: powerdash [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --feed <path>            Load telemetry feed from a JSON file");
    eprintln!("  --demo                   Use a generated synthetic feed instead");
    eprintln!("  --seed <u64>             Seed for the synthetic feed (default: 42)");
    eprintln!("  --config <path>          Load dashboard config from TOML file");
    eprintln!("  --at <timestamp>         Evaluation time (2023-07-04T12:00:00);");
    eprintln!("                           defaults to the latest feed timestamp");
    eprintln!("  --model3-amps <u32>      What-if charging amperage for the Model 3");
    eprintln!("  --modelx-amps <u32>      What-if charging amperage for the Model X");
    eprintln!("  --csv-out <path>         Export the forecast series to CSV");
    #[cfg(feature = "api")]
    {
        eprintln!("  --serve                  Start REST API server");
        eprintln!("  --port <u16>             API server port (default: 3000)");
    }
    eprintln!("  --help                   Show this help message");
    eprintln!();
    eprintln!("One of --feed or --demo is required.");
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        feed_path: None,
        demo: false,
        seed: 42,
        config_path: None,
        at: None,
        model3_amps: None,
        modelx_amps: None,
        csv_out: None,
        #[cfg(feature = "api")]
        serve: false,
        #[cfg(feature = "api")]
        port: 3000,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--feed" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --feed requires a path argument");
                    process::exit(1);
                }
                cli.feed_path = Some(args[i].clone());
            }
            "--demo" => {
                cli.demo = true;
            }
            "--seed" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --seed requires a u64 argument");
                    process::exit(1);
                }
                if let Ok(s) = args[i].parse::<u64>() {
                    cli.seed = s;
                } else {
                    eprintln!("error: --seed value \"{}\" is not a valid u64", args[i]);
                    process::exit(1);
                }
            }
            "--config" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --config requires a path argument");
                    process::exit(1);
                }
                cli.config_path = Some(args[i].clone());
            }
            "--at" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --at requires a timestamp argument");
                    process::exit(1);
                }
                match args[i].parse::<NaiveDateTime>() {
                    Ok(ts) => cli.at = Some(ts),
                    Err(_) => {
                        eprintln!(
                            "error: --at value \"{}\" is not a timestamp like 2023-07-04T12:00:00",
                            args[i]
                        );
                        process::exit(1);
                    }
                }
            }
            "--model3-amps" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --model3-amps requires a u32 argument");
                    process::exit(1);
                }
                match args[i].parse::<u32>() {
                    Ok(a) => cli.model3_amps = Some(a),
                    Err(_) => {
                        eprintln!("error: --model3-amps value \"{}\" is not a valid u32", args[i]);
                        process::exit(1);
                    }
                }
            }
            "--modelx-amps" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --modelx-amps requires a u32 argument");
                    process::exit(1);
                }
                match args[i].parse::<u32>() {
                    Ok(a) => cli.modelx_amps = Some(a),
                    Err(_) => {
                        eprintln!("error: --modelx-amps value \"{}\" is not a valid u32", args[i]);
                        process::exit(1);
                    }
                }
            }
            "--csv-out" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --csv-out requires a path argument");
                    process::exit(1);
                }
                cli.csv_out = Some(args[i].clone());
            }
            #[cfg(feature = "api")]
            "--serve" => {
                cli.serve = true;
            }
            #[cfg(feature = "api")]
            "--port" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --port requires a u16 argument");
                    process::exit(1);
                }
                if let Ok(p) = args[i].parse::<u16>() {
                    cli.port = p;
                } else {
                    eprintln!("error: --port value \"{}\" is not a valid u16", args[i]);
                    process::exit(1);
                }
            }
            other => {
                eprintln!("error: unknown argument \"{other}\"");
                print_help();
                process::exit(1);
            }
        }
        i += 1;
    }

    cli
}

/// Validates an override amperage against the configured charger range.
fn check_amps(name: &str, amps: u32, min: u32, max: u32) {
    if amps != 0 && !(min..=max).contains(&amps) {
        eprintln!("error: {name} ({amps}) must be 0 or between {min} and {max}");
        process::exit(1);
    }
}

fn print_forecast(series: &ForecastSeries) {
    println!("=== Forecast to End of Day ===");
    if series.is_empty() {
        println!("(no steps remain today)");
        return;
    }
    println!("{:<10} {:>10} {:>9} {:>9}", "time", "powerwall", "model3", "modelx");
    for i in 0..series.len() {
        println!(
            "{:<10} {:>9.1}% {:>9} {:>9}",
            series.labels[i],
            series.powerwall[i],
            fmt_opt(series.model3[i]),
            fmt_opt(series.modelx[i]),
        );
    }
}

fn fmt_opt(v: Option<f32>) -> String {
    match v {
        Some(pct) => format!("{pct:.1}%"),
        None => "-".to_string(),
    }
}

/// Prints how long each overridden charger needs to reach 90%.
fn print_charge_estimates(
    status: &DashboardStatus,
    config: &DashboardConfig,
    overrides: &ChargingOverride,
) {
    let cards = [
        ("Model 3", Vehicle::Model3, &status.model3, &config.model3),
        ("Model X", Vehicle::ModelX, &status.modelx, &config.modelx),
    ];
    for (name, vehicle, card, vcfg) in cards {
        let amps = overrides.amps_for(vehicle);
        if amps == 0 {
            continue;
        }
        let Some(current) = card.battery_percentage else {
            continue;
        };
        let power_kw = charger_power_kw(amps, vcfg.voltage_v);
        match hours_to_percent(current, 90.0, vcfg.capacity_kwh, power_kw) {
            Some(h) => println!(
                "{name} at {amps} A ({power_kw:.2} kW): {} to 90%",
                format_hours_hm(h)
            ),
            None => println!("{name}: already at or above 90%"),
        }
    }
}

fn main() {
    let cli = parse_args();

    let config = if let Some(ref path) = cli.config_path {
        match DashboardConfig::from_toml_file(Path::new(path)) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else {
        DashboardConfig::site_default()
    };

    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    let samples: Vec<TelemetrySample> = if let Some(ref path) = cli.feed_path {
        match feed::load_feed(Path::new(path)) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else if cli.demo {
        let date = cli
            .at
            .map(|ts| ts.date())
            .unwrap_or_else(|| chrono::Local::now().date_naive());
        synthetic_feed(date, cli.seed)
    } else {
        eprintln!("error: one of --feed or --demo is required");
        print_help();
        process::exit(1);
    };

    let Some(now) = cli.at.or_else(|| samples.last().map(|s| s.local_timestamp)) else {
        eprintln!("error: feed is empty");
        process::exit(1);
    };

    let overrides = match (cli.model3_amps, cli.modelx_amps) {
        (None, None) => None,
        (m3, mx) => {
            let model3_amps = m3.unwrap_or(0);
            let modelx_amps = mx.unwrap_or(0);
            check_amps(
                "--model3-amps",
                model3_amps,
                config.model3.min_amps,
                config.model3.max_amps,
            );
            check_amps(
                "--modelx-amps",
                modelx_amps,
                config.modelx.min_amps,
                config.modelx.max_amps,
            );
            Some(ChargingOverride {
                model3_amps,
                modelx_amps,
            })
        }
    };

    let status = DashboardStatus::from_feed(&samples, now);
    println!("{status}");

    let midnight = now
        .date()
        .and_hms_opt(0, 0, 0)
        .unwrap_or(now);
    let today = feed::day_slice(&samples, midnight, midnight + chrono::Duration::days(1));
    let yesterday = feed::day_slice(&samples, midnight - chrono::Duration::days(1), midnight);

    let engine = ForecastEngine::new(&config);
    let series = engine.run(today, yesterday, now, overrides.as_ref());
    print_forecast(&series);

    if let Some(ref ov) = overrides {
        println!();
        print_charge_estimates(&status, &config, ov);
    }

    if let Some(ref path) = cli.csv_out {
        if let Err(e) = export_csv(&series, Path::new(path)) {
            eprintln!("error: failed to write CSV: {e}");
            process::exit(1);
        }
        eprintln!("Forecast written to {path}");
    }

    #[cfg(feature = "api")]
    if cli.serve {
        use std::net::SocketAddr;
        use std::sync::Arc;

        let state = Arc::new(powerdash::api::AppState { config, samples });
        let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
        let rt = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
            eprintln!("error: failed to create tokio runtime: {e}");
            process::exit(1);
        });
        rt.block_on(powerdash::api::serve(state, addr));
    }
}

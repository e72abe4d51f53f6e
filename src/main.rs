use {
    anyhow::{Context, Result},
    clap::Parser,
    shipment_tracker::{
        AdminConsole, Cli, Command, NewShipment, ProgressResult, ShipmentRecord,
        ShipmentRepository, TrackingError, TrackingUpdate, TrackingWatcher, compute_progress_with,
        config::{PRICING, constants::display},
        domain::audit_history,
        models::StepState,
        quote_fee,
        utils::{format_long_date, now_utc},
    },
    std::{panic, sync::Arc},
    tabled::{Table, Tabled, settings::Style},
};

const BAR_WIDTH: usize = 30;

#[derive(Tabled)]
struct StepRow {
    #[tabled(rename = "")]
    marker: &'static str,
    #[tabled(rename = "")]
    icon: &'static str,
    #[tabled(rename = "Step")]
    title: &'static str,
    #[tabled(rename = "Location")]
    location: String,
    #[tabled(rename = "Details")]
    description: &'static str,
}

#[derive(Tabled)]
struct HistoryRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Location")]
    location: String,
}

#[derive(Tabled)]
struct ShipmentRow {
    #[tabled(rename = "Tracking #")]
    tracking_number: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Receiver")]
    receiver: String,
    #[tabled(rename = "Location")]
    location: String,
    #[tabled(rename = "Service")]
    service: String,
    #[tabled(rename = "Created")]
    created_at: String,
}

impl From<&ShipmentRecord> for ShipmentRow {
    fn from(r: &ShipmentRecord) -> Self {
        Self {
            tracking_number: r.tracking_number.clone(),
            status: r.status.clone(),
            receiver: r.receiver_summary(),
            location: r.current_location.clone().unwrap_or_default(),
            service: r.service_type.to_string(),
            created_at: r.created_at.clone(),
        }
    }
}

fn progress_bar(progress: &ProgressResult) -> String {
    let filled = (progress.progress_ratio.value() * BAR_WIDTH as f64).round() as usize;
    let filled = filled.min(BAR_WIDTH);
    format!(
        "[{}{}] {}",
        "█".repeat(filled),
        "░".repeat(BAR_WIDTH - filled),
        progress.progress_ratio
    )
}

fn print_progress(record: &ShipmentRecord, progress: &ProgressResult) {
    println!(
        "{}  {}  ({})",
        progress.tracking_number, record.status, record.service_type
    );
    if !progress.status_recognized {
        println!("  ! status '{}' is not a known step, showing the first step", record.status);
    }
    if progress.customs_hold {
        println!("  ! held by customs");
    }

    println!(
        "\n  {} → {}",
        progress.route.origin, progress.route.destination
    );
    println!("  {}", progress_bar(progress));
    println!(
        "  Day {} of {}. Estimated delivery: {}\n",
        progress.days_passed,
        progress.delivery_days.get(),
        format_long_date(progress.estimated_delivery_date)
    );

    let rows = progress.steps.iter().map(|step| StepRow {
        marker: match step.state {
            StepState::Completed => "✔",
            StepState::Current => "▶",
            StepState::Upcoming => "·",
        },
        icon: step.icon.glyph(),
        title: step.title,
        location: step.location.clone(),
        description: step.description,
    });
    println!("{}", Table::new(rows).with(Style::rounded()));

    if !record.status_history.is_empty() {
        let rows = record.status_history.iter().map(|e| HistoryRow {
            date: e.date.clone(),
            time: e.time.clone(),
            status: e.status.clone(),
            location: e.location.clone(),
        });
        println!("\nHistory\n{}", Table::new(rows).with(Style::rounded()));
    }

    for issue in audit_history(&record.status_history) {
        log::warn!("{}: history {}", record.tracking_number, issue);
    }
}

async fn run_track(
    repo: &dyn ShipmentRepository,
    cli: &Cli,
    tracking_number: &str,
    at: Option<chrono::DateTime<chrono::Utc>>,
) -> Result<()> {
    let Some(record) = repo.find_by_tracking_number(tracking_number.trim()).await? else {
        println!("{}: {}", display::NOT_FOUND, tracking_number);
        return Ok(());
    };

    match compute_progress_with(&record, at.unwrap_or_else(now_utc), &cli.tracking_config()) {
        Ok(progress) => print_progress(&record, &progress),
        Err(e) if e.is_status_unavailable() => {
            println!("{} {}: {}", display::STATUS_UNAVAILABLE, record.tracking_number, e);
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

async fn run_watch(repo: Arc<dyn ShipmentRepository>, cli: &Cli, tracking_number: &str) -> Result<()> {
    let (watcher, mut updates) = TrackingWatcher::spawn(&repo, tracking_number, cli.tracking_config());
    println!("Watching {} (Ctrl+C to stop)", watcher.tracking_number());

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            update = updates.recv() => match update {
                Some(TrackingUpdate::Progress(p)) => println!(
                    "{}  {}  {}  {}",
                    now_utc().format(display::TIME_FORMAT),
                    p.current_step.title,
                    p.current_step.location,
                    progress_bar(&p)
                ),
                Some(TrackingUpdate::Unavailable { reason, .. }) => {
                    println!("{}: {}", display::STATUS_UNAVAILABLE, reason);
                }
                Some(TrackingUpdate::NotFound(n)) => println!("{}: {}", display::NOT_FOUND, n),
                None => break,
            },
        }
    }

    watcher.stop();
    Ok(())
}

fn print_quote(service: shipment_tracker::ServiceType, days: u32, weight: f64) {
    match quote_fee(service, days, weight) {
        Some(fee) => println!("${:.2}", fee),
        None => {
            let services = PRICING.services.iter().map(|r| r.service.to_string());
            let options = PRICING.delivery_options.iter().map(|o| o.days.to_string());
            println!(
                "No quote for {} over {} days. Services: {}. Delivery days: {}.",
                service,
                days,
                itertools::join(services, ", "),
                itertools::join(options, ", ")
            );
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    if let Command::Quote {
        service,
        days,
        weight,
    } = &cli.command
    {
        print_quote(*service, *days, *weight);
        return Ok(());
    }

    let repo = cli.open_repository().await?;
    let admin = AdminConsole::new(repo.clone(), cli.tracking_config().transitions);

    match &cli.command {
        Command::Track { tracking_number, at } => {
            run_track(repo.as_ref(), &cli, tracking_number, *at).await?
        }
        Command::List { search } => {
            let records = admin.search(search.as_deref().unwrap_or_default()).await?;
            if records.is_empty() {
                println!("No shipments found.");
            } else {
                let rows = records.iter().map(ShipmentRow::from);
                println!("{}", Table::new(rows).with(Style::rounded()));
            }
        }
        Command::Create {
            sender_name,
            sender_address,
            sender_city,
            receiver_name,
            receiver_address,
            receiver_city,
            customer_email,
            service,
            weight,
            days,
            fee,
            value,
            description,
        } => {
            let new = NewShipment {
                sender_name: sender_name.clone(),
                sender_address: sender_address.clone(),
                sender_city: sender_city.clone(),
                receiver_name: receiver_name.clone(),
                receiver_address: receiver_address.clone(),
                receiver_city: receiver_city.clone(),
                customer_email: customer_email.clone(),
                service_type: *service,
                weight_kg: *weight,
                delivery_days: *days,
                fee: *fee,
                declared_value: value.clone(),
                description: description.clone(),
            };
            let record = admin.create_shipment(new, now_utc()).await?;
            println!(
                "Created {} (fee ${:.2}, estimated delivery {})",
                record.tracking_number,
                record.fee.unwrap_or_default(),
                record.estimated_delivery.as_deref().unwrap_or_default()
            );
        }
        Command::UpdateStatus {
            tracking_number,
            status,
            location,
        } => {
            let record = admin
                .update_status(tracking_number, status, location, now_utc())
                .await?;
            println!(
                "{} is now '{}' at {}",
                record.tracking_number,
                record.status,
                record.current_location.as_deref().unwrap_or_default()
            );
        }
        Command::Delete { tracking_number } => {
            admin.delete_shipment(tracking_number).await?;
            println!("Deleted {}", tracking_number);
        }
        Command::Watch { tracking_number } => run_watch(repo.clone(), &cli, tracking_number).await?,
        Command::Quote { .. } => {}
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::force_capture();
        log::error!("CRITICAL PANIC:\n{}\nStack Trace:\n{}", info, backtrace);
    }));

    let (global_level, my_code_level) = if cfg!(debug_assertions) {
        (log::LevelFilter::Warn, log::LevelFilter::Info)
    } else {
        (log::LevelFilter::Error, log::LevelFilter::Warn)
    };

    env_logger::Builder::new()
        .filter(None, global_level)
        .filter(Some("shipment_tracker"), my_code_level)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Err(e) => match e.downcast_ref::<TrackingError>() {
            // Domain refusals are answers, not crashes.
            Some(domain) => {
                eprintln!("{}", domain);
                std::process::exit(2);
            }
            None => Err(e).context("shipment-tracker failed"),
        },
        ok => ok,
    }
}

use anyhow::{anyhow, Result};
use clap::Parser;
use std::sync::Arc;

use gatepass::allocation::{AllocationService, Category};
use gatepass::cli::{Cli, Commands};
use gatepass::config::{self, GatepassConfig};
use gatepass::records::{Leg, OrderStatus, StageStatus, TransportType};
use gatepass::store::{JsonFileStore, Repository, RowStore, Tables};
use gatepass::telemetry::init_telemetry;
use gatepass::workflow::{NewOrder, OrderService};

fn main() -> Result<()> {
    let cli = Cli::parse();
    tokio::runtime::Runtime::new()?.block_on(run(cli))
}

async fn run(cli: Cli) -> Result<()> {
    let config = config::config()?;
    init_telemetry(&config.observability.log_level)?;

    match cli.command {
        // Default behavior: explain how to get started
        None => {
            show_overview();
            Ok(())
        }
        Some(Commands::Init { seed, force }) => init_command(config, seed, force).await,
        Some(Commands::Status) => status_command(config).await,
        Some(Commands::Orders) => orders_command(config).await,
        Some(Commands::Show { order }) => show_command(config, order).await,
        Some(Commands::Create {
            material,
            weight,
            unit,
            transport,
            source,
            dest,
            legs,
            vehicles,
            manual_vehicles,
            user,
            eta,
            eta_unit,
        }) => {
            create_command(
                config,
                material,
                weight,
                unit,
                transport,
                source,
                dest,
                legs,
                vehicles,
                manual_vehicles,
                user,
                eta,
                eta_unit,
            )
            .await
        }
        Some(Commands::Approve {
            order,
            stage,
            vehicle,
            action,
            comments,
            user,
        }) => approve_command(config, order, stage, vehicle, action, comments, user).await,
        Some(Commands::Revoke {
            order,
            stage,
            vehicle,
            user,
        }) => revoke_command(config, order, stage, vehicle, user).await,
        Some(Commands::Vehicles) => vehicles_command(config).await,
        Some(Commands::Suggest {
            weight,
            category,
            min,
            max,
            staged,
            pairs,
        }) => suggest_command(config, weight, category, min, max, staged, pairs).await,
        Some(Commands::Approvals { user }) => approvals_command(config, user).await,
    }
}

fn show_overview() {
    println!("GATEPASS - Shipment Order Tracking");
    println!();
    println!("Orders move through per-vehicle approval checkpoints: order approval,");
    println!("then gate entry, consignment verification, and gate exit at each end");
    println!("of every trip. Vehicles are matched to payloads by capacity fit.");
    println!();
    println!("Quick start:");
    println!("  gatepass init                      create the store and config");
    println!("  gatepass vehicles                  see the fleet");
    println!("  gatepass suggest --weight 4000 --staged");
    println!("  gatepass create --material 'Fabric' --weight 4000 \\");
    println!("      --source 'Unit-1' --dest 'Unit-4' --vehicles KA-01-0001 --user 1");
    println!("  gatepass approvals --user 2        what can I act on?");
    println!("  gatepass approve --order 1 --stage 'Order Approved' --user 1");
    println!();
    println!("Run 'gatepass --help' for the full command list.");
}

fn open_repo(config: &GatepassConfig) -> Result<Arc<Repository>> {
    let store = JsonFileStore::open(&config.store.path)?;
    Ok(Arc::new(Repository::new(Arc::new(store))))
}

async fn order_service(config: &GatepassConfig) -> Result<OrderService> {
    let repo = open_repo(config)?;
    Ok(OrderService::load(repo, &config.roles).await?)
}

async fn init_command(config: &GatepassConfig, seed: Option<String>, force: bool) -> Result<()> {
    if std::path::Path::new("gatepass.toml").exists() && !force {
        println!("gatepass.toml already exists (use --force to overwrite)");
    } else {
        config.save_to_file("gatepass.toml")?;
        println!("Wrote gatepass.toml");
    }

    let repo = open_repo(config)?;
    if let Some(seed_path) = seed {
        let raw = tokio::fs::read_to_string(&seed_path).await?;
        let tables: Tables = serde_json::from_str(&raw)?;
        let store = repo.store();
        store.replace_departments(tables.departments).await?;
        store.replace_users(tables.users).await?;
        store.replace_vehicles(tables.vehicles).await?;
        store.replace_orders(tables.orders).await?;
        println!("Seeded store from {seed_path}");
    }

    println!("Store ready at {}", config.store.path);
    Ok(())
}

async fn status_command(config: &GatepassConfig) -> Result<()> {
    let repo = open_repo(config)?;
    let orders = repo.orders().await?;
    let vehicles = repo.vehicles().await?;
    let busy = vehicles.iter().filter(|v| v.is_busy).count();

    println!("SYSTEM STATUS");
    println!(
        "  Orders: {} total ({} open, {} in progress, {} completed, {} rejected, {} delayed)",
        orders.len(),
        orders.iter().filter(|o| o.status == OrderStatus::Open).count(),
        orders
            .iter()
            .filter(|o| o.status == OrderStatus::InProgress)
            .count(),
        orders
            .iter()
            .filter(|o| o.status == OrderStatus::Completed)
            .count(),
        orders
            .iter()
            .filter(|o| o.status == OrderStatus::Rejected)
            .count(),
        orders
            .iter()
            .filter(|o| o.status == OrderStatus::Delayed)
            .count(),
    );
    println!(
        "  Vehicles: {} total, {} busy, {} free",
        vehicles.len(),
        busy,
        vehicles.len() - busy
    );
    Ok(())
}

async fn orders_command(config: &GatepassConfig) -> Result<()> {
    let repo = open_repo(config)?;
    let orders = repo.orders().await?;
    if orders.is_empty() {
        println!("No orders yet.");
        return Ok(());
    }
    for order in orders {
        let done = order
            .stages
            .iter()
            .filter(|s| s.status == StageStatus::Completed)
            .count();
        println!(
            "#{} {} [{}] vehicles: {} stages: {}/{}",
            order.id,
            order.order_number,
            status_label(order.status),
            order.vehicles.join(", "),
            done,
            order.stages.len(),
        );
    }
    Ok(())
}

async fn show_command(config: &GatepassConfig, order_id: u64) -> Result<()> {
    let repo = open_repo(config)?;
    let order = repo
        .find_order(order_id)
        .await?
        .ok_or_else(|| anyhow!("order {order_id} not found"))?;

    println!("{} [{}]", order.order_number, status_label(order.status));
    for stage in &order.stages {
        let stamp = stage
            .approver
            .as_deref()
            .map(|a| format!(" by {a}"))
            .unwrap_or_default();
        println!(
            "  [{}] {} ({}){}",
            status_label_stage(stage.status),
            stage.label(),
            stage.vehicle,
            stamp,
        );
        if let Some(comments) = &stage.comments {
            println!("        {comments}");
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn create_command(
    config: &GatepassConfig,
    material: String,
    weight: f64,
    unit: String,
    transport: String,
    source: Option<String>,
    dest: Option<String>,
    legs: Vec<String>,
    vehicles: Option<String>,
    manual_vehicles: Option<String>,
    user: u64,
    eta: Option<f64>,
    eta_unit: String,
) -> Result<()> {
    let transport_type = match transport.as_str() {
        "single" => TransportType::Single,
        "multiple" => TransportType::Multiple,
        other => return Err(anyhow!("unknown transport type '{other}'")),
    };

    let legs = parse_legs(&legs)?;
    let new_order = NewOrder {
        material_type: material,
        material_weight: weight,
        weight_unit: unit,
        transport_type,
        source_factory: source,
        dest_factories: dest.map(|d| split_csv(&d)).unwrap_or_default(),
        legs,
        matched_vehicles: vehicles.map(|v| split_csv(&v)).unwrap_or_default(),
        manual_vehicles: manual_vehicles.map(|v| split_csv(&v)).unwrap_or_default(),
        eta_value: eta,
        eta_time_unit: Some(eta_unit),
        created_by: user,
    };

    let service = order_service(config).await?;
    let order = service.create_order(new_order).await?;
    println!(
        "Created {} with {} stages across {} vehicle(s)",
        order.order_number,
        order.stages.len(),
        order.vehicles.len(),
    );
    Ok(())
}

async fn approve_command(
    config: &GatepassConfig,
    order: u64,
    stage: String,
    vehicle: Option<String>,
    action: String,
    comments: Option<String>,
    user: u64,
) -> Result<()> {
    let service = order_service(config).await?;
    let outcome = service
        .approve_stage(
            order,
            &stage,
            vehicle.as_deref(),
            &action,
            comments.as_deref(),
            user,
        )
        .await?;
    println!(
        "Stage '{}' actioned; order is now {}",
        stage,
        status_label(outcome.order_status)
    );
    Ok(())
}

async fn revoke_command(
    config: &GatepassConfig,
    order: u64,
    stage: String,
    vehicle: Option<String>,
    user: u64,
) -> Result<()> {
    let service = order_service(config).await?;
    let outcome = service
        .revoke_rejected_stage(order, &stage, vehicle.as_deref(), user)
        .await?;
    println!(
        "Rejection of '{}' revoked; order is now {}",
        stage,
        status_label(outcome.order_status)
    );
    Ok(())
}

async fn vehicles_command(config: &GatepassConfig) -> Result<()> {
    let repo = open_repo(config)?;
    let vehicles = repo.vehicles().await?;
    if vehicles.is_empty() {
        println!("No vehicles in the fleet.");
        return Ok(());
    }
    for vehicle in vehicles {
        let state = if vehicle.is_busy {
            format!(
                "busy ({})",
                vehicle.current_order.as_deref().unwrap_or("unknown order")
            )
        } else {
            "free".to_string()
        };
        println!(
            "{} {} {} kg [{}]",
            vehicle.registration, vehicle.vehicle_type, vehicle.capacity_kg, state
        );
    }
    Ok(())
}

async fn suggest_command(
    config: &GatepassConfig,
    weight: f64,
    category: Option<String>,
    min: f64,
    max: f64,
    staged: bool,
    pairs: bool,
) -> Result<()> {
    let repo = open_repo(config)?;
    let service = AllocationService::new(repo, config.allocation.clone());

    if staged {
        let outcome = service.staged_search(weight).await?;
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }
    if pairs {
        let suggestions = service.suggest_combination(weight, min, max).await?;
        println!("{}", serde_json::to_string_pretty(&suggestions)?);
        return Ok(());
    }

    let category = category
        .as_deref()
        .map(Category::parse)
        .unwrap_or(Category::General);
    let suggestions = service
        .suggest_vehicles(weight, category, min, max)
        .await?;
    println!("{}", serde_json::to_string_pretty(&suggestions)?);
    Ok(())
}

async fn approvals_command(config: &GatepassConfig, user: u64) -> Result<()> {
    let service = order_service(config).await?;
    let pending = service.pending_approvals_for(user).await?;
    if pending.is_empty() {
        println!("Nothing waiting on user {user}.");
        return Ok(());
    }
    for item in pending {
        println!(
            "#{} {} - {} ({}) [needs {}]",
            item.order_id, item.order_number, item.stage, item.vehicle, item.required_role
        );
    }
    Ok(())
}

fn split_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_legs(raw: &[String]) -> Result<Vec<Leg>> {
    raw.iter()
        .enumerate()
        .map(|(i, leg)| {
            let (source, destination) = leg
                .split_once('>')
                .ok_or_else(|| anyhow!("leg '{leg}' must look like SOURCE>DESTINATION"))?;
            Ok(Leg {
                id: i as u64 + 1,
                source: source.trim().to_string(),
                destination: destination.trim().to_string(),
                sequence: i as u32 + 1,
            })
        })
        .collect()
}

fn status_label(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Open => "open",
        OrderStatus::InProgress => "in progress",
        OrderStatus::Completed => "completed",
        OrderStatus::Rejected => "rejected",
        OrderStatus::Delayed => "delayed",
    }
}

fn status_label_stage(status: StageStatus) -> &'static str {
    match status {
        StageStatus::Pending => "pending",
        StageStatus::Completed => "completed",
        StageStatus::Rejected => "rejected",
        StageStatus::Delayed => "delayed",
    }
}

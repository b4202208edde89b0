use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "gatepass")]
#[command(about = "Factory-gate shipment order tracking and vehicle allocation")]
#[command(long_about = "Gatepass tracks shipment orders through their approval checkpoints \
                       (order approval, gate entry, consignment verification, gate exit) and \
                       suggests vehicles by capacity fit. Start with 'gatepass init' to create \
                       the store, then 'gatepass orders' to see what is in flight.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the store file and write a default gatepass.toml
    Init {
        /// Seed the store from a JSON tables file
        #[arg(long, help = "Path to a JSON document holding the four tables")]
        seed: Option<String>,
        /// Overwrite an existing configuration file
        #[arg(long, help = "Force initialization, overwriting existing configuration")]
        force: bool,
    },
    /// Display table counts and order status summary
    Status,
    /// List all orders with their status
    Orders,
    /// Show one order with its full stage list
    Show {
        /// Order id
        #[arg(long)]
        order: u64,
    },
    /// Create an order: reserve vehicles and generate its approval stages
    Create {
        #[arg(long, help = "Material description, e.g. 'Fabric rolls'")]
        material: String,
        #[arg(long, help = "Payload weight")]
        weight: f64,
        #[arg(long, default_value = "kg", help = "Weight unit label")]
        unit: String,
        #[arg(long, default_value = "single", help = "Transport type: single or multiple")]
        transport: String,
        #[arg(long, help = "Source factory (single transport)")]
        source: Option<String>,
        #[arg(long, help = "Destination factory (single transport)")]
        dest: Option<String>,
        /// Leg of a multi-leg trip as SOURCE>DESTINATION, repeatable in order
        #[arg(long = "leg", help = "Leg as SOURCE>DESTINATION, repeat per leg")]
        legs: Vec<String>,
        #[arg(long, help = "Matched vehicle registrations, comma separated")]
        vehicles: Option<String>,
        #[arg(long, help = "Manually entered vehicle registrations, comma separated")]
        manual_vehicles: Option<String>,
        #[arg(long, help = "Acting user id")]
        user: u64,
        #[arg(long, help = "Expected arrival value, e.g. 6")]
        eta: Option<f64>,
        #[arg(long, default_value = "hours", help = "ETA unit: hours or days")]
        eta_unit: String,
    },
    /// Act on a pending stage (approve, reject, verified, ...)
    Approve {
        #[arg(long)]
        order: u64,
        #[arg(long, help = "Stage name, e.g. 'Vehicle Entry Approved (Unit-1)'")]
        stage: String,
        #[arg(long, help = "Vehicle registration; required when the order has several")]
        vehicle: Option<String>,
        #[arg(long, default_value = "approve")]
        action: String,
        #[arg(long)]
        comments: Option<String>,
        #[arg(long, help = "Acting user id")]
        user: u64,
    },
    /// Revoke a rejected stage back to pending
    Revoke {
        #[arg(long)]
        order: u64,
        #[arg(long)]
        stage: String,
        #[arg(long)]
        vehicle: Option<String>,
        #[arg(long, help = "Acting user id")]
        user: u64,
    },
    /// List the vehicle fleet
    Vehicles,
    /// Suggest vehicles for a payload weight
    Suggest {
        #[arg(long)]
        weight: f64,
        #[arg(long, help = "Request category; 'wastage' skips utilization bands")]
        category: Option<String>,
        #[arg(long, default_value = "70", help = "Minimum utilization percent")]
        min: f64,
        #[arg(long, default_value = "100", help = "Maximum utilization percent")]
        max: f64,
        /// Walk the tier ladder instead of a single band
        #[arg(long, help = "Staged search: 100% singles down to combinations and fallbacks")]
        staged: bool,
        /// Exhaustive two-vehicle combination search
        #[arg(long, help = "Search exactly-two-vehicle combinations")]
        pairs: bool,
    },
    /// List pending stages the user is allowed to act on
    Approvals {
        #[arg(long, help = "User id to list approvals for")]
        user: u64,
    },
}

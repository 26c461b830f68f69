use clap::Subcommand;

use crate::cli::utils::{connect_state, output_data};
use crate::cli::OutputFormat;
use crate::database::models::{Location, LocationId};
use crate::services::LocationNode;

#[derive(Subcommand)]
pub enum LocationCommands {
    #[command(about = "Print the whole location forest")]
    Tree,

    #[command(about = "List root locations")]
    Roots,

    #[command(about = "List direct children of a location")]
    Children {
        #[arg(help = "Parent location id")]
        id: LocationId,
    },

    #[command(about = "List every location below a location, breadth-first")]
    Descendants {
        #[arg(help = "Location id")]
        id: LocationId,
    },

    #[command(about = "List the parent chain of a location, nearest first")]
    Ancestors {
        #[arg(help = "Location id")]
        id: LocationId,
    },
}

pub async fn handle(cmd: LocationCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let service = connect_state().await?.locations;

    match cmd {
        LocationCommands::Tree => {
            let forest = service.get_location_hierarchy().await?;
            output_data(output_format, &forest, |forest| {
                if forest.is_empty() {
                    println!("No locations found");
                }
                for node in forest {
                    print_node(node, 0);
                }
            })
        }
        LocationCommands::Roots => print_list(output_format, service.find_root_locations().await?),
        LocationCommands::Children { id } => print_list(output_format, service.find_child_locations(id).await?),
        LocationCommands::Descendants { id } => {
            print_list(output_format, service.get_location_descendants(id).await?)
        }
        LocationCommands::Ancestors { id } => print_list(output_format, service.get_location_ancestors(id).await?),
    }
}

fn summary(location: &Location) -> String {
    match &location.location_type {
        Some(kind) => format!("#{} {} [{}]", location.id, location.location_name, kind),
        None => format!("#{} {}", location.id, location.location_name),
    }
}

fn print_node(node: &LocationNode, depth: usize) {
    println!("{}{}", "  ".repeat(depth), summary(&node.location));
    for child in &node.child_locations {
        print_node(child, depth + 1);
    }
}

fn print_list(output_format: OutputFormat, locations: Vec<Location>) -> anyhow::Result<()> {
    output_data(output_format, &locations, |locations| {
        if locations.is_empty() {
            println!("No locations found");
        }
        for location in locations {
            println!("{}", summary(location));
        }
    })
}

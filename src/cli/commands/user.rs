use clap::Subcommand;

use crate::cli::utils::{connect_state, output_data};
use crate::cli::OutputFormat;
use crate::database::models::{Role, UserId};
use crate::services::MenuItem;

#[derive(Subcommand)]
pub enum UserCommands {
    #[command(about = "Show the navigation menu a user would see")]
    Menu {
        #[arg(help = "User id")]
        id: UserId,
    },

    #[command(about = "List a user's roles")]
    Roles {
        #[arg(help = "User id")]
        id: UserId,
    },

    #[command(about = "Replace a user's roles (no names clears them)")]
    AssignRoles {
        #[arg(help = "User id")]
        id: UserId,
        #[arg(help = "Role names, e.g. Administrator Manager")]
        roles: Vec<String>,
    },
}

pub async fn handle(cmd: UserCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let service = connect_state().await?.users;

    match cmd {
        UserCommands::Menu { id } => {
            let menu = service.get_user_menu(id).await?;
            output_data(output_format, &menu, |menu| {
                if menu.is_empty() {
                    println!("User {} has no menu entries", id);
                }
                for item in menu {
                    print_item(item, 0);
                }
            })
        }
        UserCommands::Roles { id } => {
            let roles = service.user_roles(id).await?;
            print_roles(output_format, &roles)
        }
        UserCommands::AssignRoles { id, roles } => {
            let assigned = service.assign_roles(id, &roles).await?;
            print_roles(output_format, &assigned)
        }
    }
}

fn print_item(item: &MenuItem, depth: usize) {
    let url = item.url.as_deref().unwrap_or("-");
    println!("{}#{} {} ({})", "  ".repeat(depth), item.id, item.name, url);
    for child in &item.children {
        print_item(child, depth + 1);
    }
}

fn print_roles(output_format: OutputFormat, roles: &[Role]) -> anyhow::Result<()> {
    output_data(output_format, roles, |roles| {
        if roles.is_empty() {
            println!("No roles");
        }
        for role in roles {
            println!("#{} {}", role.id, role.role_name);
        }
    })
}

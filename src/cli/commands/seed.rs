use crate::cli::utils::{connect_state, output_data};
use crate::cli::OutputFormat;

pub async fn handle(output_format: OutputFormat) -> anyhow::Result<()> {
    let state = connect_state().await?;
    let report = state.seeder().run().await?;

    output_data(output_format, &report, |report| {
        if report.is_empty() {
            println!("✓ Seed data already present, nothing created");
        } else {
            println!("✓ Seeding complete");
            println!("  applications: {}", report.applications);
            println!("  roles:        {}", report.roles);
            println!("  permissions:  {}", report.permissions);
            println!("  users:        {}", report.users);
            println!("  user roles:   {}", report.user_roles);
        }
    })
}

use std::io::{self, Write};

use bcrypt::DEFAULT_COST;
use dotenvy::dotenv;
use vira_express::db;
use vira_express::services::accounts::{self, MIN_PASSWORD_LEN};
use vira_express::store::PgProfileStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("🛡️  ViraExpress - Create Admin");
    println!("==============================");

    dotenv().ok();

    let database_url = std::env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set in .env file")?;
    let pool = db::create_pool(&database_url).await?;

    print!("Email address: ");
    io::stdout().flush()?;
    let mut email = String::new();
    io::stdin().read_line(&mut email)?;
    let email = email.trim().to_string();

    if email.is_empty() || !email.contains('@') {
        eprintln!("❌ Invalid email address");
        return Ok(());
    }

    print!("Password: ");
    io::stdout().flush()?;
    let password = rpassword::read_password()?;

    if password.chars().count() < MIN_PASSWORD_LEN {
        eprintln!("❌ Password must be at least {} characters long", MIN_PASSWORD_LEN);
        return Ok(());
    }

    print!("Password (again): ");
    io::stdout().flush()?;
    let password_confirm = rpassword::read_password()?;

    if password != password_confirm {
        eprintln!("❌ Passwords don't match");
        return Ok(());
    }

    let store = PgProfileStore::new(pool.clone());
    match accounts::create_admin(&store, &email, &password, DEFAULT_COST).await {
        Ok(admin) => {
            println!();
            println!("✅ Admin ready!");
            println!("   ID: {}", admin.id);
            println!("   Email: {}", admin.email);
            println!("   Plan: {}", admin.plan);
            println!();
            println!("🔐 Log in through POST /api/auth/login with these credentials");
        }
        Err(e) => {
            eprintln!("❌ Failed to create admin: {}", e);
        }
    }

    pool.close().await;
    Ok(())
}

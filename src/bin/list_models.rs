use dotenvy::dotenv;
use vira_express::config::Config;
use vira_express::gemini_client::GeminiClient;

/// Print the models the configured key can use and whether they generate content.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    let config = Config::from_env()?;
    let client = GeminiClient::new(config.gemini_api_key.clone(), config.gemini_base_url.clone());

    println!("🤖 Models available on {} ({})", config.gemini_base_url, config.models.api_version);
    let models = client.list_models(&config.models.api_version).await?;
    for model in &models {
        let generates = model
            .supported_generation_methods
            .iter()
            .any(|m| m == "generateContent");
        println!(
            "{} {:<45} {}",
            if generates { "✅" } else { "  " },
            model.name,
            model.display_name.as_deref().unwrap_or("")
        );
    }

    for configured in [
        &config.models.idea_model,
        &config.models.strategy_model,
        &config.models.image_model,
    ] {
        let found = models.iter().any(|m| m.name.trim_start_matches("models/") == configured.as_str());
        if !found {
            println!("⚠️  Configured model {} is not in the list", configured);
        }
    }
    Ok(())
}

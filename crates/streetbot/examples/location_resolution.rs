//! Location resolution from chat messages
//!
//! This example resolves a handful of messages against the bundled Toronto
//! gazetteer and shows which strategy matched and what radius was picked.

use streetbot::ServiceLocator;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    streetbot::init_logging(tracing::Level::WARN)?;
    let locator = ServiceLocator::new_embedded()?;

    println!("{}", locator.info().summary());

    let messages = [
        "yonge and dundas",
        "jane finch",
        "I need help near Yonge and Dundas",
        "I'm at kipling station, anything within walking distance?",
        "closest shelter to union station",
        "food banks near the eaton centre within 3 km",
        "I need food",
    ];

    println!("\nResolution:");
    for message in messages {
        match locator.resolve_explained(message) {
            Some(resolved) => println!(
                "  {message:?}\n     → {} [{} from {}], radius {}m",
                resolved.context.address,
                resolved.strategy,
                resolved.category,
                locator.extract_radius(message),
            ),
            None => println!("  {message:?}\n     → no location, ask the user where they are"),
        }
    }

    println!("\nBatch resolution:");
    for (message, location) in messages.iter().zip(locator.resolve_batch(&messages)) {
        let shown = location.map_or_else(|| "-".to_string(), |l| l.coordinates.to_string());
        println!("  {shown:>20}  {message}");
    }

    Ok(())
}

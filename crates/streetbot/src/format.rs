//! Plain-text rendering of search results for chat replies.
use itertools::Itertools;

use crate::{resolve::LocationContext, search::ServiceRecord};

/// Render `services` found around `location` as a numbered list.
///
/// An empty list produces a hint to widen the search instead.
pub fn format_location_response(services: &[ServiceRecord], location: &LocationContext) -> String {
    if services.is_empty() {
        return format!(
            "No services found within {}km of {}. Try expanding your search radius or searching city-wide.",
            f64::from(location.search_radius) / 1000.0,
            location.address
        );
    }

    let header = format!(
        "Found {} services near {}:\n\n",
        services.len(),
        location.address
    );
    let cards = services
        .iter()
        .enumerate()
        .map(|(i, service)| service_card(i + 1, service))
        .join("\n");

    header + &cards
}

fn service_card(number: usize, service: &ServiceRecord) -> String {
    let distance = service
        .distance_km()
        .map(|km| format!(" ({km:.2} km)"))
        .unwrap_or_default();
    let address = [&service.address_street, &service.address_city]
        .into_iter()
        .flatten()
        .filter(|part| !part.trim().is_empty())
        .join(", ");

    let lines = [
        Some(format!("{number}. **{}**{distance}", service.title)),
        Some(format!("   Category: {}", service.category)),
        (!address.is_empty()).then(|| format!("   Address: {address}")),
        service
            .phone
            .as_deref()
            .filter(|p| !p.is_empty())
            .map(|phone| format!("   Phone: {phone}")),
        service
            .website
            .as_deref()
            .filter(|w| !w.is_empty())
            .map(|website| format!("   Website: {website}")),
    ];
    lines.into_iter().flatten().map(|line| line + "\n").collect()
}

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::Query;
use axum::routing::get;
use axum::{Json, Router};
use directory_core::{BakeryDirectory, DetailPresenter, EnrichmentReport};
use places_integration::HttpPlaceLookup;
use serde_json::{json, Value};
use shared::domain::{BakerySeed, GeoPoint, PlaceId, TagState};
use tokio::net::TcpListener;

async fn details_handler(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    let body = match params.get("place_id").map(String::as_str) {
        Some("manresa-lg") => json!({
            "status": "OK",
            "result": {
                "geometry": { "location": { "lat": 37.2267, "lng": -121.9846 } },
                "opening_hours": {
                    "weekday_text": ["Monday: 8:00 AM - 3:00 PM", "Tuesday: 8:00 AM - 3:00 PM"]
                },
                "website": "https://manresabread.com",
                "international_phone_number": "+1 408-402-5372",
                "photos": [
                    { "photo_reference": "manresa-front" },
                    { "photo_reference": "manresa-counter" }
                ],
                "tags": { "organic": true, "milled_in_house": true }
            }
        }),
        Some("ab-sf") => json!({
            "status": "OK",
            "result": {
                "geometry": { "location": { "lat": 37.7832, "lng": -122.4591 } },
                "website": "https://arsicault-bakery.com"
            }
        }),
        _ => json!({ "status": "NOT_FOUND" }),
    };
    Json(body)
}

#[tokio::test]
async fn seed_enrich_sort_search_and_present_acceptance() {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    let app = Router::new().route("/details/json", get(details_handler));
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    let endpoint = format!("http://{addr}/details/json");
    let lookup = HttpPlaceLookup::with_endpoint(&endpoint, "acceptance-key").expect("endpoint");
    let directory = BakeryDirectory::with_lookup(Arc::new(lookup));

    directory
        .load(vec![
            BakerySeed {
                place_id: PlaceId::from("manresa-lg"),
                name: "Manresa Bread".to_string(),
                formatted_address: "40 N Santa Cruz Ave, Los Gatos, CA 95030".to_string(),
            },
            BakerySeed {
                place_id: PlaceId::from("ab-sf"),
                name: "Arsicault Bakery".to_string(),
                formatted_address: "397 Arguello Blvd, San Francisco, CA 94118".to_string(),
            },
            BakerySeed {
                place_id: PlaceId::from("gone"),
                name: "Mayfield Bakery".to_string(),
                formatted_address: "855 El Camino Real, Palo Alto, CA 94301".to_string(),
            },
        ])
        .await;

    let report = directory.enrich_all().await;
    assert_eq!(
        report,
        EnrichmentReport {
            enriched: 2,
            failed: 1,
            cancelled: 0,
        }
    );

    let failures = directory.lookup_failures().await;
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].place_id, PlaceId::from("gone"));
    assert_eq!(failures[0].message, "place not found");

    let manresa = directory
        .find(&PlaceId::from("manresa-lg"))
        .await
        .expect("manresa record");
    assert_eq!(
        manresa.location,
        Some(GeoPoint::new(37.2267, -121.9846))
    );
    assert_eq!(manresa.website.as_deref(), Some("https://manresabread.com"));
    assert_eq!(manresa.tags.organic, TagState::Confirmed);
    assert_eq!(manresa.tags.milled_in_house, TagState::Confirmed);
    assert_eq!(manresa.tags.serves_food, TagState::Unknown);
    assert!(!manresa.needs_details());

    let gone = directory
        .find(&PlaceId::from("gone"))
        .await
        .expect("failed record stays in the set");
    assert!(gone.needs_details());
    assert_eq!(gone.website, None);

    // Richmond district user: Arsicault is a short walk, Los Gatos a drive,
    // and the record that never resolved a location sorts last.
    directory
        .set_user_location(GeoPoint::new(37.7793, -122.4193))
        .await;
    let ordered: Vec<String> = directory
        .records()
        .await
        .iter()
        .map(|r| r.place_id.as_str().to_string())
        .collect();
    assert_eq!(ordered, vec!["ab-sf", "manresa-lg", "gone"]);

    let matches = directory.search("BAKERY").await;
    let names: Vec<&str> = matches.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Arsicault Bakery", "Mayfield Bakery"]);

    assert_eq!(directory.display_name(&manresa), "Manresa Bread - Los Gatos");
    let arsicault = directory
        .find(&PlaceId::from("ab-sf"))
        .await
        .expect("arsicault record");
    assert_eq!(directory.display_name(&arsicault), "Arsicault Bakery");

    let presenter = DetailPresenter::new();
    assert_eq!(
        presenter.format_hours(&manresa),
        "Monday: 8:00 AM - 3:00 PM\nTuesday: 8:00 AM - 3:00 PM"
    );
    assert_eq!(
        presenter.photo_urls(&manresa, 400, "acceptance-key"),
        vec![
            "https://maps.googleapis.com/maps/api/place/photo?maxwidth=400&photoreference=manresa-front&key=acceptance-key",
            "https://maps.googleapis.com/maps/api/place/photo?maxwidth=400&photoreference=manresa-counter&key=acceptance-key",
        ]
    );
    let label = presenter
        .distance_label(&arsicault)
        .expect("distance label after sort");
    assert!(label.ends_with(" miles away"), "unexpected label: {label}");
    let website = presenter.website_action(&arsicault);
    assert!(website.enabled);
    assert_eq!(website.label, "https://arsicault-bakery.com");

    let second_pass = directory.enrich_all().await;
    assert_eq!(second_pass.enriched, 0);
    assert_eq!(second_pass.cancelled, 0);
}

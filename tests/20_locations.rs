mod common;

use anyhow::Result;
use certdesk_api::database::models::{LocationId, LocationPatch, LocationQuery, NewLocation};
use certdesk_api::services::LocationError;

fn names(locations: &[certdesk_api::database::models::Location]) -> Vec<&str> {
    locations.iter().map(|l| l.location_name.as_str()).collect()
}

#[tokio::test]
async fn plant_hierarchy_resolves() -> Result<()> {
    let app = common::TestApp::seeded().await?;
    let (plant, line, station) = app.plant().await?;
    let service = &app.state.locations;

    assert_eq!(names(&service.find_root_locations().await?), vec!["Plant A"]);
    assert_eq!(names(&service.find_child_locations(plant.id).await?), vec!["Line 1"]);
    assert_eq!(
        names(&service.get_location_descendants(plant.id).await?),
        vec!["Line 1", "Station 1"]
    );
    assert_eq!(
        names(&service.get_location_ancestors(station.id).await?),
        vec!["Line 1", "Plant A"]
    );
    assert!(service.get_location_ancestors(plant.id).await?.is_empty());
    assert!(service.get_location_descendants(station.id).await?.is_empty());

    let detail = service.find_one(station.id).await?;
    assert_eq!(detail.full_location_path, "Plant A > Line 1 > Station 1");
    assert_eq!(detail.location.parent_location_id, Some(line.id));
    Ok(())
}

async fn snapshot(
    app: &common::TestApp,
    plant: LocationId,
    line: LocationId,
    station: LocationId,
) -> Result<serde_json::Value> {
    let locations = &app.state.locations;
    Ok(serde_json::json!({
        "roots": locations.find_root_locations().await?,
        "children": locations.find_child_locations(plant).await?,
        "descendants": locations.get_location_descendants(plant).await?,
        "ancestors": locations.get_location_ancestors(station).await?,
        "detail": locations.find_one(line).await?,
        "hierarchy": locations.get_location_hierarchy().await?,
        "menu": app.state.users.get_user_menu(app.admin.id).await?,
    }))
}

#[tokio::test]
async fn resolvers_are_stable_without_writes() -> Result<()> {
    let app = common::TestApp::seeded().await?;
    let (plant, line, station) = app.plant().await?;
    app.add_location("Line 2", Some(plant.id)).await?;
    app.add_location("Depot", None).await?;
    let first = snapshot(&app, plant.id, line.id, station.id).await?;
    let second = snapshot(&app, plant.id, line.id, station.id).await?;
    assert_eq!(first, second);
    assert_eq!(first["roots"].as_array().map(Vec::len), Some(2));
    Ok(())
}

#[tokio::test]
async fn unknown_ids() -> Result<()> {
    let app = common::TestApp::seeded().await?;
    app.plant().await?;
    let service = &app.state.locations;

    assert!(service.find_child_locations(9999).await?.is_empty());
    assert!(matches!(
        service.get_location_descendants(9999).await,
        Err(LocationError::NotFound(9999))
    ));
    assert!(matches!(
        service.get_location_ancestors(9999).await,
        Err(LocationError::NotFound(9999))
    ));
    Ok(())
}

#[tokio::test]
async fn siblings_are_newest_first() -> Result<()> {
    let app = common::TestApp::seeded().await?;
    let plant = app.add_location("Plant A", None).await?;
    app.add_location("Line 1", Some(plant.id)).await?;
    app.add_location("Line 2", Some(plant.id)).await?;
    app.add_location("Line 3", Some(plant.id)).await?;

    let children = app.state.locations.find_child_locations(plant.id).await?;
    assert_eq!(names(&children), vec!["Line 3", "Line 2", "Line 1"]);
    Ok(())
}

#[tokio::test]
async fn create_validates_and_checks_parent() -> Result<()> {
    let app = common::TestApp::seeded().await?;
    let service = &app.state.locations;

    let err = service.create(NewLocation::named("  ", None), None).await.unwrap_err();
    match err {
        LocationError::Validation(fields) => assert!(fields.contains_key("location_name")),
        other => panic!("expected validation error, got {other:?}"),
    }

    let mut off_map = NewLocation::named("Offshore", None);
    off_map.latitude = Some(123.0);
    assert!(matches!(
        service.create(off_map, None).await,
        Err(LocationError::Validation(_))
    ));

    assert!(matches!(
        service.create(NewLocation::named("Orphan", Some(4242)), None).await,
        Err(LocationError::ParentNotFound(4242))
    ));

    let root = service.create(NewLocation::named("Depot", None), Some(app.admin.id)).await?;
    assert!(root.is_root());
    assert_eq!(root.created_by, Some(app.admin.id));
    Ok(())
}

#[tokio::test]
async fn reparenting_rejects_cycles_and_leaves_tree_unchanged() -> Result<()> {
    let app = common::TestApp::seeded().await?;
    let (plant, line, station) = app.plant().await?;
    let service = &app.state.locations;

    let err = service
        .update(plant.id, LocationPatch::reparent(Some(station.id)), None)
        .await
        .unwrap_err();
    assert!(matches!(err, LocationError::CycleDetected { .. }));

    let err = service
        .update(line.id, LocationPatch::reparent(Some(line.id)), None)
        .await
        .unwrap_err();
    assert!(matches!(err, LocationError::CycleDetected { .. }));

    assert_eq!(names(&service.find_root_locations().await?), vec!["Plant A"]);
    assert_eq!(
        names(&service.get_location_ancestors(station.id).await?),
        vec!["Line 1", "Plant A"]
    );
    Ok(())
}

#[tokio::test]
async fn reparenting_moves_subtrees() -> Result<()> {
    let app = common::TestApp::seeded().await?;
    let (plant, line, station) = app.plant().await?;
    let depot = app.add_location("Depot", None).await?;
    let service = &app.state.locations;

    let moved = service
        .update(line.id, LocationPatch::reparent(Some(depot.id)), Some(app.admin.id))
        .await?;
    assert_eq!(moved.parent_location_id, Some(depot.id));
    assert_eq!(moved.updated_by, Some(app.admin.id));

    assert!(service.get_location_descendants(plant.id).await?.is_empty());
    assert_eq!(
        names(&service.get_location_ancestors(station.id).await?),
        vec!["Line 1", "Depot"]
    );

    service.update(line.id, LocationPatch::reparent(None), None).await?;
    let roots = service.find_root_locations().await?;
    assert_eq!(names(&roots), vec!["Depot", "Line 1", "Plant A"]);

    assert!(matches!(
        service.update(line.id, LocationPatch::reparent(Some(777)), None).await,
        Err(LocationError::ParentNotFound(777))
    ));
    Ok(())
}

#[tokio::test]
async fn soft_delete_hides_leaves_and_protects_parents() -> Result<()> {
    let app = common::TestApp::seeded().await?;
    let (plant, line, station) = app.plant().await?;
    let service = &app.state.locations;

    assert!(matches!(
        service.remove(line.id, Some(app.admin.id)).await,
        Err(LocationError::HasChildren(_))
    ));

    service.remove(station.id, Some(app.admin.id)).await?;

    assert_eq!(
        names(&service.get_location_descendants(plant.id).await?),
        vec!["Line 1"]
    );
    assert!(service.find_child_locations(line.id).await?.is_empty());
    assert!(matches!(
        service.get_location_ancestors(station.id).await,
        Err(LocationError::NotFound(_))
    ));
    assert!(matches!(service.find_one(station.id).await, Err(LocationError::NotFound(_))));
    assert!(matches!(
        service.remove(station.id, None).await,
        Err(LocationError::NotFound(_))
    ));
    Ok(())
}

#[tokio::test]
async fn listing_filters_and_bounds() -> Result<()> {
    let app = common::TestApp::seeded().await?;
    let service = &app.state.locations;

    let mut pune = NewLocation::named("Pune Works", None);
    pune.city = Some("Pune".to_string());
    pune.location_type = Some("Plant".to_string());
    pune.latitude = Some(18.52);
    pune.longitude = Some(73.85);
    pune.company_id = Some(1);
    service.create(pune, None).await?;

    let mut chennai = NewLocation::named("Chennai Yard", None);
    chennai.location_type = Some("Warehouse".to_string());
    chennai.latitude = Some(13.08);
    chennai.longitude = Some(80.27);
    chennai.is_active = Some(false);
    service.create(chennai, None).await?;

    let by_type = service
        .list(&LocationQuery {
            location_type: Some("Plant".to_string()),
            ..Default::default()
        })
        .await?;
    assert_eq!(names(&by_type), vec!["Pune Works"]);

    let by_search = service
        .list(&LocationQuery {
            search: Some("pune".to_string()),
            ..Default::default()
        })
        .await?;
    assert_eq!(names(&by_search), vec!["Pune Works"]);

    let inactive = service
        .list(&LocationQuery {
            active: Some(false),
            ..Default::default()
        })
        .await?;
    assert_eq!(names(&inactive), vec!["Chennai Yard"]);

    let by_company = service
        .list(&LocationQuery {
            company_id: Some(1),
            ..Default::default()
        })
        .await?;
    assert_eq!(by_company.len(), 1);

    let west = service.within_bounds(20.0, 75.0, 15.0, 70.0).await?;
    assert_eq!(names(&west), vec!["Pune Works"]);
    assert_eq!(service.within_bounds(20.0, 81.0, 10.0, 70.0).await?.len(), 2);
    Ok(())
}

#[tokio::test]
async fn hierarchy_nests_the_forest() -> Result<()> {
    let app = common::TestApp::seeded().await?;
    let (plant, _, station) = app.plant().await?;
    app.add_location("Depot", None).await?;

    let forest = app.state.locations.get_location_hierarchy().await?;
    assert_eq!(forest.len(), 2);
    let plant_node = forest
        .iter()
        .find(|n| n.location.id == plant.id)
        .expect("plant in forest");
    assert_eq!(plant_node.child_locations[0].child_locations[0].location.id, station.id);
    Ok(())
}

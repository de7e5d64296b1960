mod common;

use common::{allowlist, ProvenanceFixture};
use matdiscover_core::{
    figure_values, DiscoverService, FigureError, FigureValue, QuantityCatalog, Scale,
    SqliteProvenanceStore, TagIndex,
};
use serde_json::json;

fn service(fixture: &ProvenanceFixture) -> DiscoverService<&SqliteProvenanceStore> {
    let index = TagIndex::new(
        fixture.store(),
        allowlist(&[("BOLZIN", 1), ("ABCDEF", 2), ("NOGEOM", 3)]),
    );
    DiscoverService::new(index, QuantityCatalog::builtin().unwrap(), "https://explore.test")
}

#[test]
fn optimized_flag_and_geometry_source_follow_optimization() {
    let fixture = ProvenanceFixture::new();
    fixture.curated_material("BOLZIN", 1, false);
    fixture.curated_material("ABCDEF", 1, true);
    let service = service(&fixture);

    let rows = service
        .figure_rows(&["DFT Optimized", "Accessible Surface Area", "Density"])
        .unwrap();
    assert_eq!(rows.len(), 2);

    let abcdef = &rows[0];
    assert_eq!(abcdef.material_id, "ABCDEF");
    assert_eq!(abcdef.values[0], FigureValue::Bool(true));
    assert_eq!(abcdef.values[1], FigureValue::Number(1500.4));
    assert_eq!(abcdef.values[2], FigureValue::Number(1.0));

    let bolzin = &rows[1];
    assert_eq!(bolzin.material_id, "BOLZIN");
    assert_eq!(bolzin.values[0], FigureValue::Bool(false));
    assert_eq!(bolzin.values[1], FigureValue::Number(1000.9));
    assert_eq!(bolzin.values[2], FigureValue::Number(1.25));
}

#[test]
fn missing_source_node_yields_missing_value() {
    let fixture = ProvenanceFixture::new();
    let cif = fixture.node(
        "structure",
        "NOGEOM",
        Some("orig_cif"),
        json!({}),
        json!({}),
        None,
    );
    fixture.group(&common::group_label("NOGEOM", 1), &[cif]);

    let catalog = QuantityCatalog::builtin().unwrap();
    let index = TagIndex::new(fixture.store(), allowlist(&[("NOGEOM", 1)]));
    let records = index.resolve_all_materials().unwrap();

    let density = catalog.get("Density").unwrap();
    let flag = catalog.get("DFT Optimized").unwrap();
    let rows = figure_values(&records, &[density, flag]);
    assert_eq!(rows[0].values, vec![FigureValue::Missing, FigureValue::Bool(false)]);
}

#[test]
fn figure_data_carries_axes_points_and_summary() {
    let fixture = ProvenanceFixture::new();
    fixture.curated_material("BOLZIN", 1, false);
    fixture.curated_material("ABCDEF", 1, true);
    let cif = fixture.node(
        "structure",
        "NOGEOM",
        Some("orig_cif"),
        json!({}),
        json!({}),
        None,
    );
    fixture.group(&common::group_label("NOGEOM", 1), &[cif]);
    let service = service(&fixture);

    let data = service
        .figure(
            "Largest Included Sphere Diameter",
            "Probe-Occupiable Pore Volume",
            "DFT Optimized",
        )
        .unwrap();

    assert_eq!(data.x.title, "Largest Included Sphere Diameter [Å]");
    assert_eq!(data.y.scale, Scale::Log);
    assert_eq!(data.color.title, "DFT Optimized [-]");
    assert_eq!(data.message, "2 MOFs found.");
    assert_eq!(data.dropped, vec!["NOGEOM".to_string()]);

    let abcdef = data
        .points
        .iter()
        .find(|point| point.material_id == "ABCDEF")
        .unwrap();
    assert_eq!(abcdef.x, 7.25);
    assert_eq!(abcdef.color, 1.0);
    assert_eq!(abcdef.detail_url, "detail?mat_id=ABCDEF");
}

#[test]
fn figure_rejects_repeated_and_unknown_quantities() {
    let fixture = ProvenanceFixture::new();
    let service = service(&fixture);

    assert!(matches!(
        service.figure("Density", "Density Nope", "Density"),
        Err(FigureError::RepeatedQuantity(label)) if label == "Density"
    ));
    assert!(matches!(
        service.figure("Density", "Density Nope", "DFT Optimized"),
        Err(FigureError::UnknownQuantity(label)) if label == "Density Nope"
    ));
    assert!(matches!(
        service.figure_rows(&["Unknown"]),
        Err(FigureError::UnknownQuantity(_))
    ));
}

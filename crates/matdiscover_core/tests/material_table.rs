mod common;

use common::{allowlist, ProvenanceFixture};
use matdiscover_core::{DiscoverService, MaterialAllowlist, QuantityCatalog, TagIndex};
use std::path::Path;

#[test]
fn rows_follow_allowlist_order_and_source_policy() {
    let fixture = ProvenanceFixture::new();
    fixture.curated_material("BOLZIN", 1, false);
    fixture.curated_material("ABCDEF", 1, true);
    let index = TagIndex::new(
        fixture.store(),
        allowlist(&[("BOLZIN", 2), ("ABCDEF", 1), ("MISSNG", 3)]),
    );
    let service = DiscoverService::new(index, QuantityCatalog::builtin().unwrap(), "https://explore.test");

    let rows = service.material_table().unwrap();
    let ids = rows.iter().map(|row| row.material_id.as_str()).collect::<Vec<_>>();
    assert_eq!(ids, vec!["ABCDEF", "BOLZIN", "MISSNG"]);
    assert_eq!(
        rows.iter().map(|row| row.position).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );

    let abcdef = &rows[0];
    assert_eq!(abcdef.name, "ABCDEF-name-v1");
    assert_eq!(abcdef.surface_area, Some(1500));
    assert_eq!(abcdef.doi.as_deref(), Some("10.1000/example"));
    assert_eq!(abcdef.doi_url.as_deref(), Some("https://doi.org/10.1000/example"));
    assert_eq!(abcdef.detail_url, "detail?mat_id=ABCDEF");
    assert_eq!(abcdef.ligand, "ABCDEF-ligand");

    let bolzin = &rows[1];
    assert_eq!(bolzin.surface_area, Some(1000));
    assert_eq!(bolzin.elements, "C,H,O,Zn");

    let missing = &rows[2];
    assert_eq!(missing.name, "MISSNG allowlist name");
    assert_eq!(missing.surface_area, None);
    assert_eq!(missing.doi, None);
}

#[test]
fn allowlist_csv_drives_table_and_formula_fallback() {
    let fixture = ProvenanceFixture::new();
    fixture.curated_material("BOLZIN", 1, false);
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/materials-info.csv");
    let allowlist = MaterialAllowlist::load(path).unwrap();
    assert_eq!(allowlist.len(), 2);

    let index = TagIndex::new(fixture.store(), allowlist);
    let service = DiscoverService::new(index, QuantityCatalog::builtin().unwrap(), "https://explore.test");
    let rows = service.material_table().unwrap();

    let bolzin = rows.iter().find(|row| row.material_id == "BOLZIN").unwrap();
    // Blank `elements` column: derived from the structure formula.
    assert_eq!(bolzin.elements, "C,H,O,Zn");
    assert_eq!(bolzin.ligand, "pyrene");
    assert_eq!(rows[0].material_id, "BOLZIN");
}

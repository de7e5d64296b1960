use matdiscover_core::quantity::{quantity_id, DEFAULT_DESCRIPTION};
use matdiscover_core::{CatalogError, QuantityCatalog, Scale};
use std::collections::HashSet;

#[test]
fn builtin_catalog_keeps_declaration_order() {
    let catalog = QuantityCatalog::builtin().unwrap();
    let labels = catalog.labels().collect::<Vec<_>>();

    assert_eq!(labels.first(), Some(&"Density"));
    assert_eq!(labels.last(), Some(&"DFT Optimized"));
    assert_eq!(
        labels
            .iter()
            .position(|label| *label == "Accessible Surface Area"),
        Some(1)
    );
    assert_eq!(catalog.iter().count(), catalog.len());
}

#[test]
fn builtin_ids_are_unique() {
    let catalog = QuantityCatalog::builtin().unwrap();
    let mut seen = HashSet::new();
    for id in catalog.ids() {
        assert!(seen.insert(id), "duplicate quantity id {id}");
    }
    assert_eq!(seen.len(), catalog.len());
}

#[test]
fn lookup_resolves_storage_location() {
    let catalog = QuantityCatalog::builtin().unwrap();
    let asa = catalog.get("Accessible Surface Area").unwrap();

    assert_eq!(asa.source_tag, "orig_zeopp");
    assert_eq!(asa.key, "ASA_m^2/g");
    assert_eq!(asa.id, quantity_id("ASA_m^2/g", "orig_zeopp", "m^2/g"));
    assert_eq!(asa.axis_title(), "Accessible Surface Area [m^2/g]");
    assert_eq!(catalog.by_id(&asa.id).map(|q| q.label.as_str()), Some("Accessible Surface Area"));

    assert!(catalog.get("Not A Quantity").is_none());
    assert!(matches!(
        catalog.require("Not A Quantity"),
        Err(CatalogError::UnknownQuantity(label)) if label == "Not A Quantity"
    ));
}

#[test]
fn optional_fields_get_defaults() {
    let catalog = QuantityCatalog::from_yaml_str(
        "- label: Bare\n  dict: orig_zeopp\n  key: Bare_key\n  unit: '-'\n\
         - label: Logged\n  dict: orig_zeopp\n  key: Logged_key\n  unit: cm^3/g\n  scale: log\n  descr: Custom.\n",
    )
    .unwrap();

    let bare = catalog.get("Bare").unwrap();
    assert_eq!(bare.description, DEFAULT_DESCRIPTION);
    assert_eq!(bare.scale, Scale::Linear);

    let logged = catalog.get("Logged").unwrap();
    assert_eq!(logged.description, "Custom.");
    assert_eq!(logged.scale, Scale::Log);
}

#[test]
fn colliding_ids_are_rejected_at_load() {
    // Accents and separators normalize away, so both entries derive one id.
    let err = QuantityCatalog::from_yaml_str(
        "- label: First\n  dict: orig_zeopp\n  key: Pore-Size\n  unit: Å\n\
         - label: Second\n  dict: orig_zeopp\n  key: pore size\n  unit: A\n",
    )
    .unwrap_err();

    match err {
        CatalogError::DuplicateId { first, second, .. } => {
            assert_eq!(first, "First");
            assert_eq!(second, "Second");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn malformed_declarations_are_rejected() {
    let duplicate_label = QuantityCatalog::from_yaml_str(
        "- label: Same\n  dict: a\n  key: k1\n  unit: u\n- label: Same\n  dict: a\n  key: k2\n  unit: u\n",
    )
    .unwrap_err();
    assert!(matches!(duplicate_label, CatalogError::DuplicateLabel(label) if label == "Same"));

    let bad_scale = QuantityCatalog::from_yaml_str(
        "- label: Odd\n  dict: a\n  key: k\n  unit: u\n  scale: cubic\n",
    )
    .unwrap_err();
    assert!(matches!(bad_scale, CatalogError::InvalidScale { .. }));

    let unknown_field = QuantityCatalog::from_yaml_str(
        "- label: Odd\n  dict: a\n  key: k\n  unit: u\n  colour: red\n",
    )
    .unwrap_err();
    assert!(matches!(unknown_field, CatalogError::Parse(_)));
}

#[test]
fn catalog_loads_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("quantities.yml");
    std::fs::write(&path, "- label: Only\n  dict: orig_zeopp\n  key: Density\n  unit: g/cm^3\n").unwrap();

    let catalog = QuantityCatalog::load(&path).unwrap();
    assert_eq!(catalog.labels().collect::<Vec<_>>(), vec!["Only"]);

    let missing = QuantityCatalog::load(dir.path().join("absent.yml")).unwrap_err();
    assert!(matches!(missing, CatalogError::Io(_)));
}

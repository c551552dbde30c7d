use atomdb_core::{
    AtomDbConfig, AtomDbError, CovalentRadiusSource, Dataset, ErrorCategory, RecordLoader,
    SpeciesKey, VdwRadiusSource,
};
use std::path::{Path, PathBuf};

fn datapath() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/datasets")
}

fn loader() -> RecordLoader {
    RecordLoader::from_config(&AtomDbConfig::new(datapath()))
}

#[test]
fn carbon_triplet_loads_from_slater_dataset() {
    let record = loader()
        .load(&SpeciesKey::new("C", 0, 3), "slater")
        .expect("carbon triplet is in the slater fixture");

    assert_eq!(record.elem(), "C");
    assert_eq!(record.atomic_number(), 6);
    assert_eq!(record.electron_count(), 6);
    assert_eq!(record.dataset(), Dataset::Slater);
    assert_eq!(record.basis(), Some("STO"));
    assert_eq!(record.energy(), Some(-37.68861895));
    assert_eq!(record.chemical_hardness(), Some(0.36862));
    assert_eq!(
        record.profile_names().collect::<Vec<_>>(),
        vec!["d_dens", "dens", "ked", "lapl"]
    );
}

#[test]
fn orbital_vectors_are_aligned_and_non_empty() {
    let loader = loader();
    for (key, expected) in [
        (SpeciesKey::new("C", 0, 3), 6),
        (SpeciesKey::new("C", 1, 2), 5),
        (SpeciesKey::new("H", 0, 2), 1),
        (SpeciesKey::new("O", 0, 3), 8),
    ] {
        let record = loader.load(&key, "slater").expect("fixture should load");
        assert_eq!(record.mo_energies().len(), record.mo_occs().len());
        assert!(!record.mo_energies().is_empty());
        assert_eq!(record.total_occupation(), f64::from(expected));
        for name in record.profile_names() {
            for profile in record.profile(name).expect("listed profile") {
                assert_eq!(profile.grid().len(), profile.values().len());
                assert!(!profile.grid().is_empty());
            }
        }
    }
}

#[test]
fn sourced_radii_are_explicit() {
    let record = loader()
        .load(&SpeciesKey::new("c", 0, 3), "Slater")
        .expect("carbon should load");

    assert_eq!(
        record.cov_radius(CovalentRadiusSource::Cordero).expect("cordero"),
        1.436
    );
    assert_eq!(record.vdw_radius(VdwRadiusSource::Mm3).expect("mm3"), 3.647);
    assert_eq!(record.vdw_radii().len(), 7);

    let error = record
        .vdw_radius(VdwRadiusSource::Truhlar)
        .expect_err("truhlar is tabulated without a value");
    assert_eq!(error.category(), ErrorCategory::InputValidation);
    assert_eq!(error.code(), "INPUT.PROPERTY_SOURCE");
}

#[test]
fn key_parsed_from_json_finds_the_same_entry() {
    let key: SpeciesKey = serde_json::from_str(r#"{"element":"o","charge":0,"multiplicity":3}"#)
        .expect("key json is well formed");
    assert_eq!(key.file_stem(), "O_0_3_0");

    let record = loader()
        .load(&key, "slater")
        .expect("lowercase symbol resolves to the oxygen entry");
    assert_eq!(record.key(), &SpeciesKey::new("O", 0, 3));
    assert_eq!(record.elem(), "O");
}

#[test]
fn unknown_dataset_is_rejected() {
    let error = loader()
        .load(&SpeciesKey::new("C", 0, 3), "bogus")
        .expect_err("bogus is not a dataset");
    assert!(matches!(error, AtomDbError::UnknownDataset { ref dataset } if dataset == "bogus"));
    assert_eq!(
        error.diagnostic_line(),
        "ERROR: [INPUT.UNKNOWN_DATASET] unknown dataset 'bogus'"
    );
}

#[test]
fn excited_state_is_unsupported() {
    let error = loader()
        .load(&SpeciesKey::new("C", 0, 3).with_excitation(1), "slater")
        .expect_err("only ground states are compiled");
    assert!(matches!(error, AtomDbError::UnsupportedState { .. }));
}

#[test]
fn inconsistent_key_fails_before_any_read() {
    let error = loader()
        .load(&SpeciesKey::new("C", 0, 2), "slater")
        .expect_err("six electrons cannot form a doublet");
    assert!(matches!(error, AtomDbError::InvalidSpecies { ref species, .. } if species == "C_0_2_0"));

    let error = loader()
        .load(&SpeciesKey::new("Xx", 0, 1), "slater")
        .expect_err("Xx is not an element");
    assert_eq!(error.code(), "INPUT.INVALID_SPECIES");
}

#[test]
fn absent_species_is_not_found() {
    let error = loader()
        .load(&SpeciesKey::new("N", 0, 4), "slater")
        .expect_err("nitrogen is not in the fixture");
    assert!(matches!(
        error,
        AtomDbError::SpeciesNotFound { ref species, ref dataset }
            if species == "N_0_4_0" && dataset == "slater"
    ));
    assert_eq!(error.category(), ErrorCategory::DataAccess);
}

#[test]
fn schema_violations_are_malformed_data() {
    let loader = loader();

    let error = loader
        .load(&SpeciesKey::new("C", 0, 3), "gaussian")
        .expect_err("gaussian carbon has misaligned orbitals");
    assert!(matches!(
        error,
        AtomDbError::MalformedData { ref detail, .. } if detail.contains("misaligned")
    ));

    let error = loader
        .load(&SpeciesKey::new("Ne", 0, 1), "nist")
        .expect_err("neon entry is truncated");
    assert!(matches!(error, AtomDbError::MalformedData { ref dataset, .. } if dataset == "nist"));
}

#[test]
fn default_dataset_comes_from_config() {
    let loader = loader();
    assert_eq!(loader.default_dataset(), Dataset::Hci);
    let record = loader
        .load_default(&SpeciesKey::new("He", 0, 1))
        .expect("helium is in the hci fixture");
    assert_eq!(record.dataset(), Dataset::Hci);
    assert_eq!(record.basis(), Some("aug-ccpwCV5Z"));

    let slater = RecordLoader::from_config(
        &AtomDbConfig::new(datapath()).with_default_dataset(Dataset::Slater),
    );
    assert!(
        slater
            .load_default(&SpeciesKey::new("O", 0, 3))
            .is_ok()
    );
}

#[test]
fn memoized_loader_returns_equal_records() {
    let loader =
        RecordLoader::from_config(&AtomDbConfig::new(datapath()).with_memoization(true));
    let key = SpeciesKey::new("O", 0, 3);
    let first = loader.load(&key, "slater").expect("first load");
    let second = loader.load(&key, "slater").expect("memoized load");
    assert_eq!(first, second);
    assert_eq!(loader.memoized_len(), 1);
}

#[test]
fn environment_lookup_selects_datapath() {
    let root = datapath();
    let config = AtomDbConfig::from_env_with(|name| match name {
        "ATOMDB_DATAPATH" => Some(root.display().to_string()),
        "ATOMDB_DATASET" => Some("slater".to_string()),
        _ => None,
    })
    .expect("environment is valid");

    let record = RecordLoader::from_config(&config)
        .load_default(&SpeciesKey::new("H", 0, 2))
        .expect("hydrogen is in the slater fixture");
    assert_eq!(record.ionization_potential(), Some(0.5));
}

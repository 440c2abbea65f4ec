use std::{collections::HashSet, fs, path::Path};

use diaman_search::{
    config::{AppConfig, ProcessingParameters},
    make_refine, make_search,
    pipeline::train_all,
    vectorizer::serde::ArtifactStore,
    Error, FacetFilters, Field, Normalizer, Report, SearchKernel, VectorizerPair, WordDict,
};

fn report(order_id: &str, constructor: &str, descr: &str, comment: &str) -> Report {
    serde_json::from_value(serde_json::json!({
        "ORDER_ID": order_id,
        "CODE_SITE": "PY",
        "CODE_SHOP": "EMB",
        "CONSTRUCTOR": constructor,
        "DESCR_EQUI": "ligne 1",
        "DESCR_ORDER": descr,
        "COMMENT": comment,
    }))
    .unwrap()
}

fn reports() -> Vec<Report> {
    vec![
        report("A", "SKF", "moteur bruit", "roulement change"),
        report("B", "KUKA", "robot soudure arret", "pince soudure changee robot"),
        report("C", "SICK", "convoyeur bloque", "nettoyage capteur"),
        report("D", "FANUC", "robot arret", "robot rearme"),
    ]
}

fn normalizer() -> Normalizer {
    Normalizer::new(HashSet::new(), &WordDict::new())
}

fn kernel() -> SearchKernel {
    let normalizer = normalizer();
    let reports = reports();
    let description = VectorizerPair::fit("fr", "emb", Field::Description, &reports, &normalizer);
    let comment = VectorizerPair::fit("fr", "emb", Field::Comment, &reports, &normalizer);
    SearchKernel::from_parts(
        normalizer,
        ProcessingParameters::default(),
        description,
        comment,
        &AppConfig::default(),
    )
    .unwrap()
}

fn order_ids(found: &diaman_search::FilteredReports<'_>) -> Vec<String> {
    found.reports.iter().map(|r| r.report().order_id.clone()).collect()
}

#[test]
fn reports_sharing_the_query_come_first() {
    let kernel = kernel();
    let found = make_search(&kernel, "Robot soudure", &FacetFilters::default(), 10).unwrap();
    assert_eq!(order_ids(&found), vec!["B", "D"]);
    assert!(found.reports.iter().all(|r| r.similarity > 0.0));
    assert_eq!(found.constructors, vec!["FANUC", "KUKA"]);
    assert_eq!(found.sites, vec!["PY"]);
}

#[test]
fn facet_filters_and_truncation() {
    let kernel = kernel();
    let filters = FacetFilters {
        constructors: vec!["FANUC".into()],
        ..FacetFilters::default()
    };
    let found = make_search(&kernel, "robot soudure", &filters, 10).unwrap();
    assert_eq!(order_ids(&found), vec!["D"]);
    assert_eq!(found.constructors, vec!["FANUC"]);

    let found = make_search(&kernel, "robot soudure", &FacetFilters::default(), 1).unwrap();
    assert_eq!(order_ids(&found), vec!["B"]);
    assert_eq!(found.constructors, vec!["FANUC", "KUKA"]);
}

#[test]
fn unknown_words_match_nothing() {
    let kernel = kernel();
    let err = make_search(&kernel, "hydraulique", &FacetFilters::default(), 10).unwrap_err();
    assert!(matches!(err, Error::EmptyResult));
}

#[test]
fn refine_falls_back_to_frequent_words_on_a_tiny_corpus() {
    let kernel = kernel();
    let topics = make_refine(&kernel, "robot soudure", &AppConfig::default()).unwrap();
    assert_eq!(topics, vec!["robot soudure robot changee pince rearme"]);
}

#[test]
fn latest_artifact_wins() {
    let dir = tempfile::tempdir().unwrap();
    let store = ArtifactStore::new(dir.path());
    let normalizer = normalizer();
    let reports = reports();
    let older = VectorizerPair::fit("fr", "emb", Field::Comment, &reports[..2], &normalizer);
    let newer = VectorizerPair::fit("fr", "emb", Field::Comment, &reports, &normalizer);
    store.save_as(&newer, "20240301_0930").unwrap();
    store.save_as(&older, "20231231_2359").unwrap();

    let latest = store.latest("fr", "emb", Field::Comment).unwrap();
    assert!(latest.ends_with("vect_COMMENT_20240301_0930.cbor"));
    let loaded = store.load("fr", "emb", Field::Comment, None).unwrap();
    assert_eq!(loaded, newer);

    let explicit = store.field_dir("fr", "emb", Field::Comment).join("vect_COMMENT_20231231_2359.cbor");
    assert!(matches!(
        store.load("fr", "emb", Field::Description, Some(&explicit)),
        Err(Error::ArtifactMismatch(_))
    ));
}

fn write_resources(root: &Path) {
    fs::write(
        root.join("perimeter.json"),
        r#"{
            "indus_perimeter": {
                "fr": {"shops": ["emb", "fer"], "sites": {"PY": "Poissy"}}
            },
            "diaman_search_cols": ["DESCR_ORDER", "COMMENT"]
        }"#,
    )
    .unwrap();
    fs::write(
        root.join("processing_conf.toml"),
        r#"
            [vect_parameters]
            strip_accents = "unicode"
            lowercase = true
            max_df = 0.95
            min_df = 2
            [lda_parameters]
            max_iter = 10
            evaluate_every = -1
            perp_tol = 0.1
            n_components = 5
            learning_method = "batch"
            random_state = 0
        "#,
    )
    .unwrap();
    let fr = root.join("fr");
    fs::create_dir_all(&fr).unwrap();
    fs::write(fr.join("stopwords.txt"), "le\nla\nen\n").unwrap();
    fs::write(fr.join("word_dict.json"), r#"{"robot": ["robo"]}"#).unwrap();
}

#[test]
fn train_then_search() {
    let dir = tempfile::tempdir().unwrap();
    let resources = dir.path().join("resources");
    fs::create_dir_all(&resources).unwrap();
    write_resources(&resources);
    let config = AppConfig {
        resources_dir: resources,
        histo_dir: dir.path().join("histo"),
        ..AppConfig::default()
    };
    let perimeter = config.load_perimeter().unwrap();

    let mut training = reports();
    training.push(report("B", "kuka", "robot soudure arret", "pince soudure changee robot"));
    training.push(report("E", "KUKA", "", "sans description"));
    let saved = train_all(&config, &perimeter, training).unwrap();
    // the "fer" shop has no report and is skipped
    assert_eq!(saved.len(), 2);

    let (language, shop) = perimeter.resolve_search("py", "EMB").unwrap();
    let kernel = SearchKernel::load(&config, &perimeter, language, shop).unwrap();
    assert_eq!(kernel.comment.len(), 4);
    assert_eq!(kernel.processing_params.lda_parameters.n_components, 5);

    let found = make_search(&kernel, "robo soudure", &FacetFilters::default(), 10).unwrap();
    assert_eq!(order_ids(&found)[0], "B");
}

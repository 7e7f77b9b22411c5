use std::fs;
use std::sync::Arc;
use std::time::Duration;

use syncoll::api::{
    Actions, ApiResponse, CollocationService, QueryArgs, STATUS_BAD_REQUEST, STATUS_INTERNAL_SERVER_ERROR,
    STATUS_NOT_FOUND, STATUS_OK, STATUS_UNPROCESSABLE_ENTITY,
};
use syncoll::config::{Config, CorpusProps, DbConf, SyntaxProps};
use syncoll::error::Result;
use syncoll::import::{ImportOptions, import_corpus};
use syncoll::query::QueryEngine;
use syncoll::storage::Database;
use tempfile::{TempDir, tempdir};

fn tok(lemma: &str, upos: &str, deprel: &str, p_lemma: &str, p_upos: &str) -> String {
    format!("{lemma}\t{lemma}\t_\t{upos}\t_\t_\t_\t_\t_\t{deprel}\t1\t{p_lemma}\t{p_upos}\n")
}

fn setup() -> Result<(TempDir, Arc<QueryEngine>)> {
    let dir = tempdir()?;
    let vertical = dir.path().join("ud_en.vrt");
    let mut content = String::from("<doc id=\"d1\">\n<s>\n");
    for _ in 0..3 {
        content.push_str(&tok("team", "NOUN", "nmod", "leader", "NOUN"));
    }
    content.push_str(&tok("club", "NOUN", "nmod", "leader", "NOUN"));
    content.push_str(&tok("ball", "NOUN", "obj", "kick", "VERB"));
    content.push_str("</s>\n</doc>\n");
    fs::write(&vertical, content)?;

    let corpus = CorpusProps {
        name: "ud_en".to_string(),
        size: 1_000_000,
        syntax: SyntaxProps::universal_dependencies(),
        shards: 1,
    };
    let mut conf = Config::new(DbConf::new(dir.path().join("colls.db")));
    conf.corpora.0.push(corpus.clone());
    conf.validate_and_defaults()?;

    let db = Arc::new(Database::open(&conf.db)?);
    import_corpus(&db, &corpus, &vertical, &ImportOptions::default())?;
    let engine = Arc::new(QueryEngine::new(db, &conf)?);
    Ok((dir, engine))
}

fn args(pairs: &[(&'static str, &'static str)]) -> QueryArgs {
    QueryArgs::from_pairs(pairs.iter().copied())
}

#[test]
fn test_status_codes() -> Result<()> {
    let (_dir, engine) = setup()?;
    let actions = Actions::new(engine);

    let resp = actions.modifiers_of("ud_en", &args(&[("w", "leader")]));
    assert_eq!(resp.status, STATUS_OK);
    assert_eq!(resp.body["freqs"][0]["word"], "team");
    assert_eq!(resp.body["freqs"][0]["freq"], 3);
    assert_eq!(resp.body["corpusSize"], 1_000_000);

    let resp = actions.modifiers_of("ud_en", &args(&[("w", "")]));
    assert_eq!(resp.status, STATUS_UNPROCESSABLE_ENTITY);
    assert_eq!(resp.body["error"], "invalid word value");

    let resp = actions.modifiers_of("ud_en", &args(&[("pos", "NOUN")]));
    assert_eq!(resp.status, STATUS_UNPROCESSABLE_ENTITY);

    let resp = actions.modifiers_of("ud_en", &args(&[("w", "leader"), ("maxItems", "x")]));
    assert_eq!(resp.status, STATUS_BAD_REQUEST);

    let resp = actions.modifiers_of("missing", &args(&[("w", "leader")]));
    assert_eq!(resp.status, STATUS_INTERNAL_SERVER_ERROR);

    let resp = actions.dispatch("synonyms-of", "ud_en", &args(&[("w", "leader")]));
    assert_eq!(resp.status, STATUS_NOT_FOUND);
    Ok(())
}

#[test]
fn test_dispatch_by_endpoint() -> Result<()> {
    let (_dir, engine) = setup()?;
    let actions = Actions::new(engine);

    let resp = actions.dispatch("modifiers-of", "ud_en", &args(&[("w", "leader"), ("maxItems", "1")]));
    assert!(resp.is_success());
    assert_eq!(resp.body["freqs"].as_array().map(Vec::len), Some(1));

    let resp = actions.dispatch("verbs-object", "ud_en", &args(&[("w", "ball")]));
    assert_eq!(resp.body["freqs"][0]["word"], "kick");
    assert_eq!(
        resp,
        actions.verbs_object("ud_en", &args(&[("w", "ball")]))
    );
    Ok(())
}

#[tokio::test]
async fn test_collocation_service() -> Result<()> {
    let (_dir, engine) = setup()?;
    let service = CollocationService::new(engine).with_timeout(Duration::from_secs(10));

    let resp = service
        .handle("noun-modified-by", "ud_en", args(&[("w", "team")]))
        .await;
    assert_eq!(resp.status, STATUS_OK);
    assert_eq!(resp.body["freqs"][0]["word"], "leader");

    let resp = service.handle("noun-modified-by", "ud_en", QueryArgs::default()).await;
    assert_eq!(resp.status, STATUS_UNPROCESSABLE_ENTITY);
    assert_eq!(resp, ApiResponse::error(STATUS_UNPROCESSABLE_ENTITY, "invalid word value"));
    Ok(())
}

#![cfg(test)]

use crate::repository::error::RepositoryError;
use crate::tests::integration::common::TestEnv;

#[tokio::test]
async fn test_update_all_reports_every_repository() {
    let env = TestEnv::new(&["beta"]);
    for name in ["alpha", "beta", "gamma"] {
        std::fs::create_dir_all(env.upstream(name)).unwrap();
        env.add_repository(name).await;
    }

    let outcomes = env.app.repositories().update(None).await.unwrap();
    assert_eq!(outcomes.len(), 3);
    let ok: Vec<&str> = outcomes.iter().filter(|o| o.is_success()).map(|o| o.repository.name.as_str()).collect();
    assert_eq!(ok, vec!["alpha", "gamma"]);
    assert!(matches!(outcomes[1].result, Err(RepositoryError::Sync { .. })));
    assert_eq!(*env.git.pulls.lock().unwrap(), vec!["alpha", "beta", "gamma"]);
}

#[tokio::test]
async fn test_clone_failure_and_duplicate_checkout() {
    let env = TestEnv::new(&[]);
    let missing = format!("file://{}", env.upstream("missing").display());
    let err = env.app.repositories().add(&missing, false).await.unwrap_err();
    assert!(matches!(err, RepositoryError::Clone { .. }));

    std::fs::create_dir_all(env.upstream("alpha")).unwrap();
    env.add_repository("alpha").await;
    let again = format!("file://{}", env.upstream("alpha").display());
    let err = env.app.repositories().add(&again, false).await.unwrap_err();
    assert!(matches!(err, RepositoryError::CheckoutExists { .. }));
    assert_eq!(env.app.records().repositories().unwrap().len(), 1);
}

#[tokio::test]
async fn test_remove_repository() {
    let env = TestEnv::new(&[]);
    std::fs::create_dir_all(env.upstream("alpha")).unwrap();
    let repository = env.add_repository("alpha").await;

    env.app.repositories().remove(&repository).await.unwrap();
    assert!(!repository.local_path.exists());
    assert!(env.app.records().repositories().unwrap().is_empty());
}

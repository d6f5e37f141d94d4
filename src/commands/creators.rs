use crate::commands::{App, Out};
use crate::Result;

/// Lists the known creator names. They are read from the spreadsheet once per process.
pub async fn creators(app: &App) -> Result<Out<Vec<String>>> {
    let names = app.creators().get_or_fetch(app.ledger()).await;
    let message = if names.is_empty() {
        "No creators found".to_string()
    } else {
        names.join(", ")
    };
    Ok(Out::new(message, names))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_creators() {
        let env = TestEnv::new();
        let out = creators(env.app()).await.unwrap();
        assert_eq!(out.message(), "alice, bob, carol");
        creators(env.app()).await.unwrap();
        assert_eq!(env.sheet().calls().get, 1);
    }
}

// Account resolution: the platform links this tool to a user through an
// opaque OpenID. It is looked up from the environment first, then from
// account.txt, and only then requested interactively (and cached).

use std::io;

use crate::logging::RunLog;
use crate::store::KvStore;

/// Environment variable that overrides every other account source. A
/// variable that is set but empty still counts as set.
pub const OPENID_ENV: &str = "YOUTHSTUDY_OPENID";

/// Cache file holding the raw account id.
pub const ACCOUNT_FILE: &str = "account.txt";

/// Resolve the account id, first source wins. `env_value` is the raw
/// environment lookup; `prompt` is only invoked when neither the
/// environment nor the cache file has an answer, and its reply is
/// persisted verbatim. No format validation anywhere: the id is opaque.
pub fn resolve_account<S: KvStore>(
    env_value: Option<String>,
    store: &mut S,
    log: &mut RunLog,
    prompt: impl FnOnce() -> io::Result<String>,
) -> io::Result<String> {
    if let Some(id) = env_value {
        log.info("using the account id from the environment");
        return Ok(id);
    }

    if let Some(id) = store.get(ACCOUNT_FILE)? {
        log.info("read the account id from account.txt");
        return Ok(id);
    }

    log.info("account.txt not found, asking interactively");
    let id = prompt()?;
    store.put(ACCOUNT_FILE, &id)?;
    log.info("account.txt saved; keep the file to yourself");
    Ok(id)
}

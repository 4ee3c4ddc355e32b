//! Altered-account and token-balance mapping.

use crate::api::{ApiAccountTokenData, ApiAlteredAccount};
use crate::error::MapError;
use crate::model::{AccountBalanceUpdate, AccountTokenData};

use super::fields;

/// Map altered accounts to balance updates, skipping `null` entries.
///
/// Mapping is all-or-nothing: a single unparsable account or token balance
/// fails the whole list.
///
/// # Errors
///
/// Returns [`MapError::InvalidAmount`] naming `"balance"` or
/// `"token balance"` for malformed balances.
pub fn map_altered_accounts(
    accounts: &[Option<ApiAlteredAccount>],
) -> Result<Vec<AccountBalanceUpdate>, MapError> {
    accounts.iter().flatten().map(map_altered_account).collect()
}

fn map_altered_account(account: &ApiAlteredAccount) -> Result<AccountBalanceUpdate, MapError> {
    let tokens = account
        .tokens
        .iter()
        .flatten()
        .map(map_token)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(AccountBalanceUpdate {
        address: fields::address(&account.address),
        balance: fields::amount("balance", &account.balance)?,
        nonce: fields::long("account nonce", account.nonce)?,
        // The codec selects the null branch for accounts without tokens.
        tokens: (!tokens.is_empty()).then_some(tokens),
    })
}

fn map_token(token: &ApiAccountTokenData) -> Result<AccountTokenData, MapError> {
    Ok(AccountTokenData {
        nonce: fields::long("token nonce", token.nonce)?,
        identifier: token.identifier.clone(),
        balance: fields::amount("token balance", &token.balance)?,
        properties: token.properties.clone(),
    })
}

//! Account and transfer primitives over the ledger store.
//!
//! The engine never owns balances; it moves them through the [`BankKeeper`]
//! trait. [`LedgerBank`] is the store-backed implementation: balances and
//! per-denom supply live under bank key prefixes in the same store the
//! context carries, so every bank mutation is covered by whatever shadow is
//! active. That property is what makes settlement atomicity possible.

use tideflow_types::{Address, Coin, Coins, Result, SettleError};

use crate::{keys, Context};

/// Account/transfer primitives consumed by the settlement engines.
///
/// Module accounts are addressed by name; implementations derive the address
/// with [`Address::from_module_name`]. All mutating operations are atomic per
/// call: either the full coin set moves or nothing does.
pub trait BankKeeper {
    /// Moves coins from a user account into a module account.
    fn send_from_account_to_module(
        &self,
        ctx: &mut Context<'_>,
        from: &Address,
        module: &str,
        amount: &Coins,
    ) -> Result<()>;

    /// Moves coins from a module account to a user account.
    fn send_from_module_to_account(
        &self,
        ctx: &mut Context<'_>,
        module: &str,
        to: &Address,
        amount: &Coins,
    ) -> Result<()>;

    /// Moves coins between module accounts.
    fn send_from_module_to_module(
        &self,
        ctx: &mut Context<'_>,
        from: &str,
        to: &str,
        amount: &Coins,
    ) -> Result<()>;

    /// Mints new coins into a module account, growing supply.
    fn mint_to_module(&self, ctx: &mut Context<'_>, module: &str, amount: &Coins) -> Result<()>;

    /// Burns coins held by a module account, shrinking supply.
    fn burn_from_module(&self, ctx: &mut Context<'_>, module: &str, amount: &Coins)
        -> Result<()>;

    /// Balance of one denom for an account.
    fn balance(&self, ctx: &Context<'_>, address: &Address, denom: &str) -> Result<u128>;

    /// All balances of an account, in denom order.
    fn all_balances(&self, ctx: &Context<'_>, address: &Address) -> Result<Coins>;

    /// Whether any supply of `denom` is circulating.
    fn has_supply(&self, ctx: &Context<'_>, denom: &str) -> Result<bool>;
}

/// Store-backed [`BankKeeper`].
///
/// Balances are keyed `(address, denom)` with big-endian `u128` values;
/// supply is keyed by denom. Stateless: every call reads what it needs from
/// the context's store.
#[derive(Debug, Clone, Copy, Default)]
pub struct LedgerBank;

impl LedgerBank {
    fn read_amount(ctx: &Context<'_>, key: &[u8]) -> u128 {
        match ctx.get_raw(key) {
            Some(bytes) => {
                let mut buf = [0u8; 16];
                let len = bytes.len().min(16);
                buf[16 - len..].copy_from_slice(&bytes[..len]);
                u128::from_be_bytes(buf)
            }
            None => 0,
        }
    }

    fn write_amount(ctx: &mut Context<'_>, key: Vec<u8>, amount: u128) {
        if amount == 0 {
            ctx.delete_raw(&key);
        } else {
            ctx.set_raw(key, amount.to_be_bytes().to_vec());
        }
    }

    /// Validates that `from` can afford every coin, then moves them.
    ///
    /// Validation happens before the first write so a failure leaves no
    /// partial transfer behind.
    fn transfer(
        ctx: &mut Context<'_>,
        from: &Address,
        to: &Address,
        amount: &Coins,
    ) -> Result<()> {
        if from == to {
            return Ok(());
        }
        let mut moves = Vec::with_capacity(amount.iter().count());
        for coin in amount.iter() {
            let from_key = keys::balance_key(from, &coin.denom);
            let available = Self::read_amount(ctx, &from_key);
            let debited = available.checked_sub(coin.amount).ok_or_else(|| {
                SettleError::InsufficientFunds {
                    address: *from,
                    denom: coin.denom.clone(),
                    needed: coin.amount,
                    available,
                }
            })?;

            let to_key = keys::balance_key(to, &coin.denom);
            let credited = Self::read_amount(ctx, &to_key)
                .checked_add(coin.amount)
                .ok_or_else(|| SettleError::Overflow {
                    message: format!("balance overflow crediting '{}' to {to}", coin.denom),
                })?;

            moves.push((from_key, debited, to_key, credited));
        }
        for (from_key, debited, to_key, credited) in moves {
            Self::write_amount(ctx, from_key, debited);
            Self::write_amount(ctx, to_key, credited);
        }
        Ok(())
    }
}

impl BankKeeper for LedgerBank {
    fn send_from_account_to_module(
        &self,
        ctx: &mut Context<'_>,
        from: &Address,
        module: &str,
        amount: &Coins,
    ) -> Result<()> {
        Self::transfer(ctx, from, &Address::from_module_name(module), amount)
    }

    fn send_from_module_to_account(
        &self,
        ctx: &mut Context<'_>,
        module: &str,
        to: &Address,
        amount: &Coins,
    ) -> Result<()> {
        Self::transfer(ctx, &Address::from_module_name(module), to, amount)
    }

    fn send_from_module_to_module(
        &self,
        ctx: &mut Context<'_>,
        from: &str,
        to: &str,
        amount: &Coins,
    ) -> Result<()> {
        Self::transfer(
            ctx,
            &Address::from_module_name(from),
            &Address::from_module_name(to),
            amount,
        )
    }

    fn mint_to_module(&self, ctx: &mut Context<'_>, module: &str, amount: &Coins) -> Result<()> {
        let address = Address::from_module_name(module);
        for coin in amount.iter() {
            let balance_key = keys::balance_key(&address, &coin.denom);
            let supply_key = keys::supply_key(&coin.denom);
            let credited = Self::read_amount(ctx, &balance_key)
                .checked_add(coin.amount)
                .ok_or_else(|| SettleError::Overflow {
                    message: format!("balance overflow minting '{}'", coin.denom),
                })?;
            let supply = Self::read_amount(ctx, &supply_key)
                .checked_add(coin.amount)
                .ok_or_else(|| SettleError::Overflow {
                    message: format!("supply overflow minting '{}'", coin.denom),
                })?;
            Self::write_amount(ctx, balance_key, credited);
            Self::write_amount(ctx, supply_key, supply);
        }
        Ok(())
    }

    fn burn_from_module(
        &self,
        ctx: &mut Context<'_>,
        module: &str,
        amount: &Coins,
    ) -> Result<()> {
        let address = Address::from_module_name(module);
        let mut burns = Vec::with_capacity(amount.iter().count());
        for coin in amount.iter() {
            let balance_key = keys::balance_key(&address, &coin.denom);
            let supply_key = keys::supply_key(&coin.denom);
            let available = Self::read_amount(ctx, &balance_key);
            let debited = available.checked_sub(coin.amount).ok_or_else(|| {
                SettleError::InsufficientFunds {
                    address,
                    denom: coin.denom.clone(),
                    needed: coin.amount,
                    available,
                }
            })?;
            let supply = Self::read_amount(ctx, &supply_key)
                .checked_sub(coin.amount)
                .ok_or_else(|| SettleError::Overflow {
                    message: format!("supply underflow burning '{}'", coin.denom),
                })?;
            burns.push((balance_key, debited, supply_key, supply));
        }
        for (balance_key, debited, supply_key, supply) in burns {
            Self::write_amount(ctx, balance_key, debited);
            Self::write_amount(ctx, supply_key, supply);
        }
        Ok(())
    }

    fn balance(&self, ctx: &Context<'_>, address: &Address, denom: &str) -> Result<u128> {
        Ok(Self::read_amount(ctx, &keys::balance_key(address, denom)))
    }

    fn all_balances(&self, ctx: &Context<'_>, address: &Address) -> Result<Coins> {
        let prefix = keys::balance_prefix(address);
        let mut coins = Coins::new();
        for (key, _) in ctx.prefix_scan(&prefix) {
            let denom = String::from_utf8_lossy(&key[prefix.len()..]).into_owned();
            let amount = Self::read_amount(ctx, &key);
            coins.add(Coin::new(denom, amount));
        }
        Ok(coins)
    }

    fn has_supply(&self, ctx: &Context<'_>, denom: &str) -> Result<bool> {
        Ok(Self::read_amount(ctx, &keys::supply_key(denom)) > 0)
    }
}

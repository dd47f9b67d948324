//! An in-memory delayed-withdrawal bond escrow.

use crate::{BondEscrow, EscrowError, GameId};
use alloy_primitives::{Address, U256};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

/// Three and a half days between a bond being unlocked and it becoming withdrawable.
pub const ESCROW_WITHDRAWAL_DELAY: u64 = 302_400;

/// The observable phase of a bond held by the escrow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BondPhase {
    /// Deposited, not yet assigned to a recipient.
    Locked,
    /// Assigned to a recipient, waiting out the withdrawal delay.
    Unlocking,
    /// Assigned to a recipient and past the withdrawal delay.
    Withdrawable,
    /// Paid out.
    Claimed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum BondState {
    Locked,
    Unlocking {
        recipient: Address,
        amount: U256,
        unlocked_at: u64,
    },
    Claimed,
}

#[derive(Debug, Clone)]
struct EscrowEntry {
    depositor: Address,
    amount: U256,
    state: BondState,
}

/// The [DelayedEscrow] holds one bond per game and releases it in two steps separated by
/// [DelayedEscrow::delay] seconds.
#[derive(Debug, Clone)]
pub struct DelayedEscrow {
    delay: u64,
    entries: HashMap<GameId, EscrowEntry>,
    balances: HashMap<Address, U256>,
    refusing: HashSet<Address>,
}

impl Default for DelayedEscrow {
    fn default() -> Self {
        Self::new(ESCROW_WITHDRAWAL_DELAY)
    }
}

impl DelayedEscrow {
    pub fn new(delay: u64) -> Self {
        Self {
            delay,
            entries: HashMap::new(),
            balances: HashMap::new(),
            refusing: HashSet::new(),
        }
    }

    pub const fn delay(&self) -> u64 {
        self.delay
    }

    /// Returns the phase of a game's bond at `now`.
    pub fn phase(&self, game: GameId, now: u64) -> Option<BondPhase> {
        let entry = self.entries.get(&game)?;
        Some(match entry.state {
            BondState::Locked => BondPhase::Locked,
            BondState::Unlocking { unlocked_at, .. } if now >= unlocked_at + self.delay => {
                BondPhase::Withdrawable
            }
            BondState::Unlocking { .. } => BondPhase::Unlocking,
            BondState::Claimed => BondPhase::Claimed,
        })
    }

    /// The amount held for a game, and who deposited it.
    pub fn deposit_of(&self, game: GameId) -> Option<(Address, U256)> {
        self.entries
            .get(&game)
            .map(|entry| (entry.depositor, entry.amount))
    }

    /// The total paid out to an account.
    pub fn balance_of(&self, account: Address) -> U256 {
        self.balances.get(&account).copied().unwrap_or_default()
    }

    /// Makes transfers to `account` fail, as a contract without a payable fallback would.
    pub fn set_refuses_transfers(&mut self, account: Address, refuses: bool) {
        if refuses {
            self.refusing.insert(account);
        } else {
            self.refusing.remove(&account);
        }
    }
}

impl BondEscrow for DelayedEscrow {
    fn deposit(&mut self, game: GameId, depositor: Address, value: U256) {
        let entry = self.entries.entry(game).or_insert(EscrowEntry {
            depositor,
            amount: U256::ZERO,
            state: BondState::Locked,
        });
        entry.amount += value;
        debug!(target: "bond_escrow", %game, %depositor, %value, "Deposited bond");
    }

    fn unlock(
        &mut self,
        game: GameId,
        recipient: Address,
        amount: U256,
        now: u64,
    ) -> Result<(), EscrowError> {
        let entry = self
            .entries
            .get_mut(&game)
            .ok_or(EscrowError::UnknownBond(game))?;
        match entry.state {
            BondState::Locked => {}
            BondState::Unlocking { .. } => return Err(EscrowError::AlreadyUnlocked { game }),
            BondState::Claimed => return Err(EscrowError::AlreadyClaimed(game)),
        }
        if amount > entry.amount {
            return Err(EscrowError::InsufficientBond(game));
        }

        entry.state = BondState::Unlocking {
            recipient,
            amount,
            unlocked_at: now,
        };
        info!(target: "bond_escrow", %game, %recipient, %amount, "Unlocked bond");
        Ok(())
    }

    fn withdraw(
        &mut self,
        game: GameId,
        recipient: Address,
        amount: U256,
        now: u64,
    ) -> Result<bool, EscrowError> {
        let delay = self.delay;
        let entry = self
            .entries
            .get_mut(&game)
            .ok_or(EscrowError::UnknownBond(game))?;
        let unlocked_at = match entry.state {
            BondState::Unlocking {
                recipient: unlocked_for,
                amount: unlocked_amount,
                unlocked_at,
            } if unlocked_for == recipient && unlocked_amount == amount => unlocked_at,
            BondState::Claimed => return Err(EscrowError::AlreadyClaimed(game)),
            _ => return Err(EscrowError::NotUnlocked(game)),
        };

        let ready_at = unlocked_at + delay;
        if now < ready_at {
            return Err(EscrowError::WithdrawalDelayNotElapsed { game, ready_at });
        }
        if self.refusing.contains(&recipient) {
            debug!(target: "bond_escrow", %game, %recipient, "Recipient refused bond transfer");
            return Ok(false);
        }

        entry.state = BondState::Claimed;
        entry.amount -= amount;
        *self.balances.entry(recipient).or_default() += amount;
        info!(target: "bond_escrow", %game, %recipient, %amount, "Withdrew bond");
        Ok(true)
    }

    fn withdrawable_at(&self, game: GameId) -> Option<u64> {
        match self.entries.get(&game)?.state {
            BondState::Unlocking { unlocked_at, .. } => Some(unlocked_at + self.delay),
            _ => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const GAME: GameId = GameId(0);
    const CREATOR: Address = Address::repeat_byte(0x01);
    const RECIPIENT: Address = Address::repeat_byte(0x02);

    fn funded() -> DelayedEscrow {
        let mut escrow = DelayedEscrow::new(100);
        escrow.deposit(GAME, CREATOR, U256::from(10));
        escrow
    }

    #[test]
    fn phases_follow_unlock_and_delay() {
        let mut escrow = funded();
        assert_eq!(escrow.phase(GAME, 0), Some(BondPhase::Locked));
        assert_eq!(escrow.deposit_of(GAME), Some((CREATOR, U256::from(10))));

        escrow.unlock(GAME, RECIPIENT, U256::from(10), 50).unwrap();
        assert_eq!(escrow.phase(GAME, 149), Some(BondPhase::Unlocking));
        assert_eq!(escrow.phase(GAME, 150), Some(BondPhase::Withdrawable));
        assert_eq!(escrow.withdrawable_at(GAME), Some(150));

        assert_eq!(
            escrow.withdraw(GAME, RECIPIENT, U256::from(10), 149),
            Err(EscrowError::WithdrawalDelayNotElapsed {
                game: GAME,
                ready_at: 150
            })
        );
        assert_eq!(escrow.withdraw(GAME, RECIPIENT, U256::from(10), 150), Ok(true));
        assert_eq!(escrow.phase(GAME, 150), Some(BondPhase::Claimed));
        assert_eq!(escrow.balance_of(RECIPIENT), U256::from(10));
        assert_eq!(
            escrow.withdraw(GAME, RECIPIENT, U256::from(10), 500),
            Err(EscrowError::AlreadyClaimed(GAME))
        );
    }

    #[test]
    fn withdraw_requires_matching_unlock() {
        let mut escrow = funded();
        assert_eq!(
            escrow.withdraw(GAME, RECIPIENT, U256::from(10), 1_000),
            Err(EscrowError::NotUnlocked(GAME))
        );
        escrow.unlock(GAME, RECIPIENT, U256::from(10), 0).unwrap();
        assert_eq!(
            escrow.withdraw(GAME, CREATOR, U256::from(10), 1_000),
            Err(EscrowError::NotUnlocked(GAME))
        );
        assert_eq!(
            escrow.unlock(GAME, CREATOR, U256::from(10), 0),
            Err(EscrowError::AlreadyUnlocked { game: GAME })
        );
    }

    #[test]
    fn unlock_checks_amount_and_existence() {
        let mut escrow = funded();
        assert_eq!(
            escrow.unlock(GAME, RECIPIENT, U256::from(11), 0),
            Err(EscrowError::InsufficientBond(GAME))
        );
        assert_eq!(
            escrow.unlock(GameId(9), RECIPIENT, U256::from(1), 0),
            Err(EscrowError::UnknownBond(GameId(9)))
        );
    }

    #[test]
    fn refused_transfer_changes_nothing() {
        let mut escrow = funded();
        escrow.set_refuses_transfers(RECIPIENT, true);
        escrow.unlock(GAME, RECIPIENT, U256::from(10), 0).unwrap();
        assert_eq!(escrow.withdraw(GAME, RECIPIENT, U256::from(10), 100), Ok(false));
        assert_eq!(escrow.phase(GAME, 100), Some(BondPhase::Withdrawable));
        assert_eq!(escrow.balance_of(RECIPIENT), U256::ZERO);

        escrow.set_refuses_transfers(RECIPIENT, false);
        assert_eq!(escrow.withdraw(GAME, RECIPIENT, U256::from(10), 100), Ok(true));
    }
}

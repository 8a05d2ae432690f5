use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shopfloor_core::{
    Aggregate, AggregateRoot, BranchOfficeId, DomainError, DomainResult, OrganizationId,
    ProductId, ProfileId, StockMovementId, WarehouseId,
};

/// Kind of ledger entry. Serialized as its numeric wire code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i16", into = "i16")]
pub enum MovementType {
    /// Goods received: stock increases by `qty`.
    In,
    /// Goods leaving: stock decreases by `qty` and may not go below zero.
    Out,
    /// Physical count: stock becomes `qty`.
    Set,
}

impl MovementType {
    pub fn code(self) -> i16 {
        match self {
            MovementType::In => 1,
            MovementType::Out => 2,
            MovementType::Set => 3,
        }
    }

    /// Parse a code as it arrives in a request body. Missing or out of range
    /// codes are rule violations, like any other unknown code.
    pub fn from_code(code: Option<i64>) -> DomainResult<Self> {
        let code = code.unwrap_or(0);
        i16::try_from(code)
            .map_err(|_| {
                DomainError::invariant(format!(
                    "invalid stock movement type {code} (expected 1=IN, 2=OUT, 3=SET)"
                ))
            })
            .and_then(MovementType::try_from)
    }
}

impl TryFrom<i16> for MovementType {
    type Error = DomainError;

    fn try_from(code: i16) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(MovementType::In),
            2 => Ok(MovementType::Out),
            3 => Ok(MovementType::Set),
            other => Err(DomainError::invariant(format!(
                "invalid stock movement type {other} (expected 1=IN, 2=OUT, 3=SET)"
            ))),
        }
    }
}

impl From<MovementType> for i16 {
    fn from(value: MovementType) -> Self {
        value.code()
    }
}

/// Identity of a stock count: one product at one warehouse.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StockKey {
    pub warehouse_id: WarehouseId,
    pub product_id: ProductId,
}

/// On-hand quantity of a product at a warehouse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockCount {
    pub organization_id: OrganizationId,
    pub branch_office_id: BranchOfficeId,
    #[serde(flatten)]
    pub key: StockKey,
    pub stock: i64,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Command: append one entry to the ledger of a stock count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordMovement {
    pub movement_id: StockMovementId,
    pub organization_id: OrganizationId,
    pub profile_id: ProfileId,
    pub warehouse_id: WarehouseId,
    pub product_id: ProductId,
    pub movement_type: MovementType,
    pub qty: i64,
    pub lot: String,
    pub occurred_at: DateTime<Utc>,
}

impl RecordMovement {
    pub fn key(&self) -> StockKey {
        StockKey {
            warehouse_id: self.warehouse_id,
            product_id: self.product_id,
        }
    }
}

/// Immutable ledger entry. It is also the event a stock count applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMovement {
    pub id: StockMovementId,
    pub organization_id: OrganizationId,
    pub profile_id: ProfileId,
    pub branch_office_id: BranchOfficeId,
    pub warehouse_id: WarehouseId,
    pub product_id: ProductId,
    #[serde(rename = "type")]
    pub movement_type: MovementType,
    pub qty: i64,
    pub stock_before: i64,
    pub stock_after: i64,
    pub lot: String,
    pub created_at: DateTime<Utc>,
}

impl StockCount {
    /// A count that has never seen a movement.
    pub fn open(
        organization_id: OrganizationId,
        branch_office_id: BranchOfficeId,
        key: StockKey,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            organization_id,
            branch_office_id,
            key,
            stock: 0,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Decide and apply in one step, returning the written ledger entry.
    pub fn record(&mut self, cmd: &RecordMovement) -> DomainResult<StockMovement> {
        let mut events = self.handle(cmd)?;
        let movement = events
            .pop()
            .ok_or_else(|| DomainError::invariant("stock movement produced no ledger entry"))?;
        self.apply(&movement);
        Ok(movement)
    }

    fn stock_after(&self, movement_type: MovementType, qty: i64) -> DomainResult<i64> {
        let before = self.stock;
        let after = match movement_type {
            MovementType::Set => qty,
            MovementType::In => before
                .checked_add(qty)
                .ok_or_else(|| DomainError::invariant("stock overflow"))?,
            MovementType::Out => before - qty,
        };
        if after < 0 {
            return Err(DomainError::invariant(format!(
                "insufficient stock: {before} on hand, {qty} requested"
            )));
        }
        Ok(after)
    }
}

impl AggregateRoot for StockCount {
    type Id = StockKey;

    fn id(&self) -> &Self::Id {
        &self.key
    }

    fn version(&self) -> u64 {
        self.version
    }
}

impl Aggregate for StockCount {
    type Command = RecordMovement;
    type Event = StockMovement;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        self.stock = event.stock_after;
        self.updated_at = event.created_at;
        self.version += 1;
    }

    fn handle(&self, cmd: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        if cmd.organization_id != self.organization_id {
            return Err(DomainError::invariant("organization mismatch"));
        }
        if cmd.key() != self.key {
            return Err(DomainError::invariant("stock count key mismatch"));
        }
        if cmd.qty < 0 {
            return Err(DomainError::invariant("qty must be zero or greater"));
        }

        let stock_after = self.stock_after(cmd.movement_type, cmd.qty)?;

        Ok(vec![StockMovement {
            id: cmd.movement_id,
            organization_id: cmd.organization_id,
            profile_id: cmd.profile_id,
            branch_office_id: self.branch_office_id,
            warehouse_id: cmd.warehouse_id,
            product_id: cmd.product_id,
            movement_type: cmd.movement_type,
            qty: cmd.qty,
            stock_before: self.stock,
            stock_after,
            lot: cmd.lot.clone(),
            created_at: cmd.occurred_at,
        }])
    }
}

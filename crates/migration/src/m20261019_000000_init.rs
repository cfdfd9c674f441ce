//! Initial schema.
//!
//! - `users`: trusted usernames
//! - `ledgers`: accounting scopes owned by a user
//! - `ledger_memberships`: shared ledger access with a role
//! - `bank_accounts`: accounts of a ledger
//! - `bank_transactions`: bank movements, matched to at most one booking
//! - `categories`: category forest per ledger
//! - `matchers`: filters + target stored as JSON
//! - `bookings` / `booking_records`: double-entry journal
//!
//! `booking_records.category_id` and `categories.parent_id` carry no foreign
//! key: bookings outlive deleted categories, and so do orphaned subtrees.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Users {
    Table,
    Username,
}

#[derive(Iden)]
enum Ledgers {
    Table,
    Id,
    Name,
    NameNorm,
    UserId,
}

#[derive(Iden)]
enum LedgerMemberships {
    Table,
    LedgerId,
    UserId,
    Role,
}

#[derive(Iden)]
enum BankAccounts {
    Table,
    Id,
    LedgerId,
    Name,
    NameNorm,
}

#[derive(Iden)]
enum BankTransactions {
    Table,
    Id,
    BankAccountId,
    OccurredAt,
    AmountMinor,
    Description,
    Counterparty,
    MatchedBookingId,
}

#[derive(Iden)]
enum Categories {
    Table,
    Id,
    LedgerId,
    Name,
    NameNorm,
    Description,
    ParentId,
}

#[derive(Iden)]
enum Matchers {
    Table,
    Id,
    LedgerId,
    Name,
    NameNorm,
    Filters,
    TargetKind,
    Target,
}

#[derive(Iden)]
enum Bookings {
    Table,
    Id,
    LedgerId,
    OccurredAt,
    Description,
}

#[derive(Iden)]
enum BookingRecords {
    Table,
    Id,
    BookingId,
    Position,
    CategoryId,
    AmountMinor,
    MatchedBankAccountId,
    MatchedTransactionId,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Username)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Ledgers::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Ledgers::Id).blob().not_null().primary_key())
                    .col(ColumnDef::new(Ledgers::Name).string().not_null())
                    .col(ColumnDef::new(Ledgers::NameNorm).string().not_null())
                    .col(ColumnDef::new(Ledgers::UserId).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-ledgers-user_id")
                            .from(Ledgers::Table, Ledgers::UserId)
                            .to(Users::Table, Users::Username),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-ledgers-user_id-name_norm-unique")
                    .table(Ledgers::Table)
                    .col(Ledgers::UserId)
                    .col(Ledgers::NameNorm)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(LedgerMemberships::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(LedgerMemberships::LedgerId).blob().not_null())
                    .col(ColumnDef::new(LedgerMemberships::UserId).string().not_null())
                    .col(ColumnDef::new(LedgerMemberships::Role).string().not_null())
                    .primary_key(
                        Index::create()
                            .col(LedgerMemberships::LedgerId)
                            .col(LedgerMemberships::UserId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-ledger_memberships-ledger_id")
                            .from(LedgerMemberships::Table, LedgerMemberships::LedgerId)
                            .to(Ledgers::Table, Ledgers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-ledger_memberships-user_id")
                            .from(LedgerMemberships::Table, LedgerMemberships::UserId)
                            .to(Users::Table, Users::Username),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-ledger_memberships-user_id")
                    .table(LedgerMemberships::Table)
                    .col(LedgerMemberships::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(BankAccounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BankAccounts::Id)
                            .blob()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BankAccounts::LedgerId).blob().not_null())
                    .col(ColumnDef::new(BankAccounts::Name).string().not_null())
                    .col(ColumnDef::new(BankAccounts::NameNorm).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-bank_accounts-ledger_id")
                            .from(BankAccounts::Table, BankAccounts::LedgerId)
                            .to(Ledgers::Table, Ledgers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-bank_accounts-ledger_id-name_norm-unique")
                    .table(BankAccounts::Table)
                    .col(BankAccounts::LedgerId)
                    .col(BankAccounts::NameNorm)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Bookings::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Bookings::Id).blob().not_null().primary_key())
                    .col(ColumnDef::new(Bookings::LedgerId).blob().not_null())
                    .col(ColumnDef::new(Bookings::OccurredAt).timestamp().not_null())
                    .col(ColumnDef::new(Bookings::Description).string())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-bookings-ledger_id")
                            .from(Bookings::Table, Bookings::LedgerId)
                            .to(Ledgers::Table, Ledgers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-bookings-ledger_id-occurred_at")
                    .table(Bookings::Table)
                    .col(Bookings::LedgerId)
                    .col(Bookings::OccurredAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(BankTransactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BankTransactions::Id)
                            .blob()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(BankTransactions::BankAccountId)
                            .blob()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BankTransactions::OccurredAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BankTransactions::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BankTransactions::Description)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(BankTransactions::Counterparty).string())
                    .col(ColumnDef::new(BankTransactions::MatchedBookingId).blob())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-bank_transactions-bank_account_id")
                            .from(BankTransactions::Table, BankTransactions::BankAccountId)
                            .to(BankAccounts::Table, BankAccounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-bank_transactions-matched_booking_id")
                            .from(BankTransactions::Table, BankTransactions::MatchedBookingId)
                            .to(Bookings::Table, Bookings::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-bank_transactions-bank_account_id-occurred_at")
                    .table(BankTransactions::Table)
                    .col(BankTransactions::BankAccountId)
                    .col(BankTransactions::OccurredAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Categories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Categories::Id)
                            .blob()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Categories::LedgerId).blob().not_null())
                    .col(ColumnDef::new(Categories::Name).string().not_null())
                    .col(ColumnDef::new(Categories::NameNorm).string().not_null())
                    .col(ColumnDef::new(Categories::Description).string())
                    .col(ColumnDef::new(Categories::ParentId).blob())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-categories-ledger_id")
                            .from(Categories::Table, Categories::LedgerId)
                            .to(Ledgers::Table, Ledgers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-categories-ledger_id-parent_id")
                    .table(Categories::Table)
                    .col(Categories::LedgerId)
                    .col(Categories::ParentId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Matchers::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Matchers::Id).blob().not_null().primary_key())
                    .col(ColumnDef::new(Matchers::LedgerId).blob().not_null())
                    .col(ColumnDef::new(Matchers::Name).string().not_null())
                    .col(ColumnDef::new(Matchers::NameNorm).string().not_null())
                    .col(ColumnDef::new(Matchers::Filters).text().not_null())
                    .col(ColumnDef::new(Matchers::TargetKind).string().not_null())
                    .col(ColumnDef::new(Matchers::Target).text().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-matchers-ledger_id")
                            .from(Matchers::Table, Matchers::LedgerId)
                            .to(Ledgers::Table, Ledgers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-matchers-ledger_id-name_norm-unique")
                    .table(Matchers::Table)
                    .col(Matchers::LedgerId)
                    .col(Matchers::NameNorm)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(BookingRecords::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BookingRecords::Id)
                            .blob()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BookingRecords::BookingId).blob().not_null())
                    .col(ColumnDef::new(BookingRecords::Position).integer().not_null())
                    .col(ColumnDef::new(BookingRecords::CategoryId).blob().not_null())
                    .col(
                        ColumnDef::new(BookingRecords::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(BookingRecords::MatchedBankAccountId).blob())
                    .col(ColumnDef::new(BookingRecords::MatchedTransactionId).blob())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-booking_records-booking_id")
                            .from(BookingRecords::Table, BookingRecords::BookingId)
                            .to(Bookings::Table, Bookings::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-booking_records-booking_id-position")
                    .table(BookingRecords::Table)
                    .col(BookingRecords::BookingId)
                    .col(BookingRecords::Position)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-booking_records-category_id")
                    .table(BookingRecords::Table)
                    .col(BookingRecords::CategoryId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BookingRecords::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Matchers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Categories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BankTransactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Bookings::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BankAccounts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(LedgerMemberships::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Ledgers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}

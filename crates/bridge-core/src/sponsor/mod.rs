//! Fee-payer substitution for Solana transactions.
//!
//! A transaction built for one fee payer is decompiled into explicit
//! instructions, optionally prefixed with a transfer funding the original
//! payer, and recompiled as a v0 message paid by the sponsor. Signatures are
//! left empty for the caller to fill in.

use bridge_ledger::{LedgerError, LedgerService};
use bridge_types::{truncate_id, without_0x_prefix, APIError};
use futures::future::try_join_all;
use solana_sdk::{
	address_lookup_table::AddressLookupTableAccount,
	instruction::Instruction,
	message::{v0, VersionedMessage},
	pubkey::Pubkey,
	signature::Signature,
	system_instruction,
	transaction::VersionedTransaction,
};
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

pub mod accounts;

use accounts::{rebuild_instruction, resolve_account_keys, AccountPermissions};

/// Errors that can occur while rewriting a transaction.
#[derive(Debug, Error)]
pub enum SponsorError {
	#[error("Invalid sponsor address: {0}")]
	InvalidSponsor(String),
	#[error("Malformed transaction: {0}")]
	MalformedTransaction(String),
	#[error("Lookup table not found: {0}")]
	MissingLookupTable(String),
	#[error("Transaction has no required signers")]
	NoSigners,
	#[error("Cannot infer the original fee payer")]
	CannotInferSigner,
	#[error("Upstream failure: {0}")]
	UpstreamFailure(String),
	#[error("Internal error: {0}")]
	Internal(String),
}

impl From<LedgerError> for SponsorError {
	fn from(err: LedgerError) -> Self {
		SponsorError::UpstreamFailure(err.to_string())
	}
}

impl From<SponsorError> for APIError {
	fn from(err: SponsorError) -> Self {
		let message = err.to_string();
		match err {
			SponsorError::InvalidSponsor(_) => APIError::bad_request("INVALID_SPONSOR", message),
			SponsorError::MalformedTransaction(_) => {
				APIError::bad_request("MALFORMED_TRANSACTION", message)
			},
			SponsorError::MissingLookupTable(_) => {
				APIError::bad_request("MISSING_LOOKUP_TABLE", message)
			},
			SponsorError::NoSigners => APIError::bad_request("NO_SIGNERS", message),
			SponsorError::CannotInferSigner => {
				APIError::bad_request("CANNOT_INFER_SIGNER", message)
			},
			SponsorError::UpstreamFailure(_) => APIError::unavailable("UPSTREAM_FAILURE", message),
			SponsorError::Internal(_) => APIError::internal("INTERNAL_ERROR", message),
		}
	}
}

/// Rewrites transactions so a sponsor pays the network fee.
#[derive(Clone)]
pub struct FeePayerRewriter {
	ledger: Arc<LedgerService>,
}

impl FeePayerRewriter {
	pub fn new(ledger: Arc<LedgerService>) -> Self {
		Self { ledger }
	}

	/// Replaces the fee payer of the hex-encoded transaction `tx_hex` with
	/// `sponsor` and returns the new transaction, hex-encoded.
	///
	/// Accepts legacy and v0 input; the output is always v0. When
	/// `fund_lamports` is positive a system transfer from the sponsor to the
	/// original payer is placed before the original instructions.
	pub async fn rewrite(
		&self,
		sponsor: &str,
		tx_hex: &str,
		fund_lamports: Option<u64>,
	) -> Result<String, SponsorError> {
		let sponsor = Pubkey::from_str(sponsor.trim())
			.map_err(|e| SponsorError::InvalidSponsor(format!("{}: {}", sponsor, e)))?;
		let transaction = decode_transaction(tx_hex)?;
		let message = &transaction.message;

		let header = message.header();
		if header.num_required_signatures == 0 {
			return Err(SponsorError::NoSigners);
		}
		let original_payer = *message
			.static_account_keys()
			.first()
			.ok_or(SponsorError::CannotInferSigner)?;

		let lookups = message.address_table_lookups().unwrap_or_default();
		let tables = try_join_all(lookups.iter().map(|lookup| self.fetch_table(lookup.account_key)))
			.await?;

		let keys = resolve_account_keys(message.static_account_keys(), lookups, &tables)?;
		let permissions = AccountPermissions::derive(header, keys.len())?;
		let original = message
			.instructions()
			.iter()
			.map(|compiled| rebuild_instruction(compiled, &keys, &permissions))
			.collect::<Result<Vec<_>, _>>()?;

		let funding = fund_lamports.filter(|lamports| *lamports > 0);
		let mut instructions: Vec<Instruction> = Vec::with_capacity(original.len() + 1);
		if let Some(lamports) = funding {
			instructions.push(system_instruction::transfer(&sponsor, &original_payer, lamports));
		}
		instructions.extend(original);

		let compiled = v0::Message::try_compile(
			&sponsor,
			&instructions,
			&tables,
			*message.recent_blockhash(),
		)
		.map_err(|e| SponsorError::MalformedTransaction(format!("cannot recompile: {}", e)))?;

		let signers = usize::from(compiled.header.num_required_signatures);
		let rewritten = VersionedTransaction {
			signatures: vec![Signature::default(); signers],
			message: VersionedMessage::V0(compiled),
		};
		let bytes = bincode::serialize(&rewritten)
			.map_err(|e| SponsorError::Internal(format!("cannot encode transaction: {}", e)))?;

		tracing::info!(
			sponsor = %truncate_id(&sponsor.to_string()),
			original_payer = %truncate_id(&original_payer.to_string()),
			lookup_tables = tables.len(),
			instructions = instructions.len(),
			funded = funding.is_some(),
			"Replaced fee payer"
		);
		Ok(hex::encode(bytes))
	}

	async fn fetch_table(&self, key: Pubkey) -> Result<AddressLookupTableAccount, SponsorError> {
		self.ledger
			.get_address_lookup_table(&key)
			.await?
			.ok_or_else(|| SponsorError::MissingLookupTable(key.to_string()))
	}
}

fn decode_transaction(tx_hex: &str) -> Result<VersionedTransaction, SponsorError> {
	let bytes = hex::decode(without_0x_prefix(tx_hex.trim()))
		.map_err(|e| SponsorError::MalformedTransaction(format!("invalid hex: {}", e)))?;
	bincode::deserialize(&bytes)
		.map_err(|e| SponsorError::MalformedTransaction(format!("cannot decode transaction: {}", e)))
}

#[cfg(test)]
mod tests {
	use super::*;
	use bridge_ledger::{LedgerInterface, MockLedgerInterface};
	use solana_sdk::{
		hash::Hash,
		instruction::AccountMeta,
		message::Message,
	};
	use std::collections::HashMap;

	fn rewriter(ledger: MockLedgerInterface) -> FeePayerRewriter {
		let mut implementations: HashMap<String, Arc<dyn LedgerInterface>> = HashMap::new();
		implementations.insert("mock".to_string(), Arc::new(ledger));
		FeePayerRewriter::new(Arc::new(
			LedgerService::new(implementations, "mock".to_string()).unwrap(),
		))
	}

	fn encode(message: VersionedMessage) -> String {
		let signers = usize::from(message.header().num_required_signatures);
		let tx = VersionedTransaction {
			signatures: vec![Signature::default(); signers],
			message,
		};
		hex::encode(bincode::serialize(&tx).unwrap())
	}

	fn decode(hex_tx: &str) -> VersionedTransaction {
		bincode::deserialize(&hex::decode(hex_tx).unwrap()).unwrap()
	}

	/// Resolves every instruction of `message` into (program, accounts, data).
	fn triples(
		message: &VersionedMessage,
		tables: &[AddressLookupTableAccount],
	) -> Vec<(Pubkey, Vec<Pubkey>, Vec<u8>)> {
		let lookups = message.address_table_lookups().unwrap_or_default();
		let used: Vec<AddressLookupTableAccount> = lookups
			.iter()
			.map(|l| tables.iter().find(|t| t.key == l.account_key).unwrap().clone())
			.collect();
		let keys = resolve_account_keys(message.static_account_keys(), lookups, &used).unwrap();
		message
			.instructions()
			.iter()
			.map(|ix| {
				(
					keys[usize::from(ix.program_id_index)],
					ix.accounts.iter().map(|&i| keys[usize::from(i)]).collect(),
					ix.data.clone(),
				)
			})
			.collect()
	}

	fn memo_instruction(payer: Pubkey, extra: Pubkey) -> Instruction {
		Instruction::new_with_bytes(
			Pubkey::new_unique(),
			b"hello",
			vec![AccountMeta::new(payer, true), AccountMeta::new_readonly(extra, false)],
		)
	}

	#[tokio::test]
	async fn test_sponsor_becomes_fee_payer() {
		let payer = Pubkey::new_unique();
		let sponsor = Pubkey::new_unique();
		let ix = memo_instruction(payer, Pubkey::new_unique());
		let message = VersionedMessage::Legacy(Message::new_with_blockhash(
			&[ix],
			Some(&payer),
			&Hash::new_unique(),
		));
		let blockhash = *message.recent_blockhash();
		let before = triples(&message, &[]);

		let mut ledger = MockLedgerInterface::new();
		ledger.expect_get_address_lookup_table().never();
		let out = rewriter(ledger)
			.rewrite(&sponsor.to_string(), &encode(message), None)
			.await
			.unwrap();

		let tx = decode(&out);
		assert!(matches!(tx.message, VersionedMessage::V0(_)));
		assert_eq!(tx.message.static_account_keys()[0], sponsor);
		assert_eq!(*tx.message.recent_blockhash(), blockhash);
		// sponsor and the original payer both sign now
		assert_eq!(tx.message.header().num_required_signatures, 2);
		assert_eq!(tx.signatures, vec![Signature::default(); 2]);
		assert_eq!(triples(&tx.message, &[]), before);
	}

	#[tokio::test]
	async fn test_zero_funding_keeps_instruction_count() {
		let payer = Pubkey::new_unique();
		let ix = memo_instruction(payer, Pubkey::new_unique());
		let message = VersionedMessage::Legacy(Message::new(&[ix], Some(&payer)));
		let input = encode(message);

		let out = rewriter(MockLedgerInterface::new())
			.rewrite(&Pubkey::new_unique().to_string(), &format!("0x{}", input), Some(0))
			.await
			.unwrap();
		assert_eq!(decode(&out).message.instructions().len(), 1);
	}

	#[tokio::test]
	async fn test_funding_prepends_transfer() {
		let payer = Pubkey::new_unique();
		let sponsor = Pubkey::new_unique();
		let ix = memo_instruction(payer, Pubkey::new_unique());
		let message = VersionedMessage::Legacy(Message::new(&[ix], Some(&payer)));
		let before = triples(&message, &[]);

		let out = rewriter(MockLedgerInterface::new())
			.rewrite(&sponsor.to_string(), &encode(message), Some(5_000))
			.await
			.unwrap();

		let tx = decode(&out);
		let after = triples(&tx.message, &[]);
		assert_eq!(after.len(), 2);
		let transfer = system_instruction::transfer(&sponsor, &payer, 5_000);
		assert_eq!(
			after[0],
			(
				transfer.program_id,
				vec![sponsor, payer],
				transfer.data
			)
		);
		assert_eq!(after[1..], before[..]);
	}

	#[tokio::test]
	async fn test_lookup_tables_are_resolved_and_reattached() {
		let payer = Pubkey::new_unique();
		let loaded = Pubkey::new_unique();
		let table = AddressLookupTableAccount {
			key: Pubkey::new_unique(),
			addresses: vec![Pubkey::new_unique(), loaded],
		};
		let ix = Instruction::new_with_bytes(
			Pubkey::new_unique(),
			&[1, 2, 3],
			vec![AccountMeta::new(payer, true), AccountMeta::new(loaded, false)],
		);
		let compiled =
			v0::Message::try_compile(&payer, &[ix], &[table.clone()], Hash::new_unique()).unwrap();
		assert_eq!(compiled.address_table_lookups.len(), 1);
		let message = VersionedMessage::V0(compiled);
		let before = triples(&message, &[table.clone()]);

		let mut ledger = MockLedgerInterface::new();
		let served = table.clone();
		ledger
			.expect_get_address_lookup_table()
			.times(1)
			.returning(move |_| Ok(Some(served.clone())));

		let out = rewriter(ledger)
			.rewrite(&Pubkey::new_unique().to_string(), &encode(message), None)
			.await
			.unwrap();

		let tx = decode(&out);
		let lookups = tx.message.address_table_lookups().unwrap();
		assert_eq!(lookups.len(), 1);
		assert_eq!(lookups[0].account_key, table.key);
		assert_eq!(triples(&tx.message, &[table]), before);
	}

	#[tokio::test]
	async fn test_missing_lookup_table() {
		let payer = Pubkey::new_unique();
		let table = AddressLookupTableAccount {
			key: Pubkey::new_unique(),
			addresses: vec![Pubkey::new_unique()],
		};
		let ix = Instruction::new_with_bytes(
			Pubkey::new_unique(),
			&[],
			vec![AccountMeta::new(payer, true), AccountMeta::new(table.addresses[0], false)],
		);
		let compiled =
			v0::Message::try_compile(&payer, &[ix], &[table], Hash::new_unique()).unwrap();

		let mut ledger = MockLedgerInterface::new();
		ledger.expect_get_address_lookup_table().returning(|_| Ok(None));

		let err = rewriter(ledger)
			.rewrite(
				&Pubkey::new_unique().to_string(),
				&encode(VersionedMessage::V0(compiled)),
				None,
			)
			.await
			.unwrap_err();
		assert!(matches!(err, SponsorError::MissingLookupTable(_)));
	}

	#[tokio::test]
	async fn test_ledger_failure_is_upstream() {
		let payer = Pubkey::new_unique();
		let table = AddressLookupTableAccount {
			key: Pubkey::new_unique(),
			addresses: vec![Pubkey::new_unique()],
		};
		let ix = Instruction::new_with_bytes(
			Pubkey::new_unique(),
			&[],
			vec![AccountMeta::new(payer, true), AccountMeta::new(table.addresses[0], false)],
		);
		let compiled =
			v0::Message::try_compile(&payer, &[ix], &[table], Hash::new_unique()).unwrap();

		let mut ledger = MockLedgerInterface::new();
		ledger
			.expect_get_address_lookup_table()
			.returning(|_| Err(LedgerError::Network("connection refused".into())));

		let err = rewriter(ledger)
			.rewrite(
				&Pubkey::new_unique().to_string(),
				&encode(VersionedMessage::V0(compiled)),
				None,
			)
			.await
			.unwrap_err();
		assert!(matches!(err, SponsorError::UpstreamFailure(_)));
		assert_eq!(APIError::from(err).status_code(), 503);
	}

	#[tokio::test]
	async fn test_rejects_bad_input_before_ledger_calls() {
		let mut ledger = MockLedgerInterface::new();
		ledger.expect_get_address_lookup_table().never();
		let rewriter = rewriter(ledger);

		let err = rewriter.rewrite("not-a-key", "00", None).await.unwrap_err();
		assert!(matches!(err, SponsorError::InvalidSponsor(_)));

		let sponsor = Pubkey::new_unique().to_string();
		let err = rewriter.rewrite(&sponsor, "zz", None).await.unwrap_err();
		assert!(matches!(err, SponsorError::MalformedTransaction(_)));

		let err = rewriter.rewrite(&sponsor, "0102", None).await.unwrap_err();
		assert!(matches!(err, SponsorError::MalformedTransaction(_)));
	}

	#[tokio::test]
	async fn test_unsigned_message_rejected() {
		let program = Pubkey::new_unique();
		let ix = Instruction::new_with_bytes(
			program,
			&[],
			vec![AccountMeta::new(Pubkey::new_unique(), false)],
		);
		let message = VersionedMessage::Legacy(Message::new(&[ix], None));
		assert_eq!(message.header().num_required_signatures, 0);

		let err = rewriter(MockLedgerInterface::new())
			.rewrite(&Pubkey::new_unique().to_string(), &encode(message), None)
			.await
			.unwrap_err();
		assert!(matches!(err, SponsorError::NoSigners));
	}
}

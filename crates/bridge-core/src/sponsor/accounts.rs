//! Account resolution for compiled messages.
//!
//! Instruction account indices in a compiled message point into a single list
//! made of the static keys followed by the addresses loaded from lookup
//! tables. These helpers rebuild that list and the signer/writable flags so
//! instructions can be expressed with explicit [`AccountMeta`]s again.

use super::SponsorError;
use solana_sdk::{
	address_lookup_table::AddressLookupTableAccount,
	instruction::{AccountMeta, CompiledInstruction, Instruction},
	message::{v0::MessageAddressTableLookup, MessageHeader},
	pubkey::Pubkey,
};

/// Builds the resolved key list: static keys, then every writable lookup
/// entry (table order, then index order), then every read-only entry.
///
/// `tables[i]` must be the table named by `lookups[i]`.
pub fn resolve_account_keys(
	static_keys: &[Pubkey],
	lookups: &[MessageAddressTableLookup],
	tables: &[AddressLookupTableAccount],
) -> Result<Vec<Pubkey>, SponsorError> {
	if lookups.len() != tables.len() {
		return Err(SponsorError::Internal(format!(
			"{} lookups but {} tables",
			lookups.len(),
			tables.len()
		)));
	}

	let mut writable = Vec::new();
	let mut readonly = Vec::new();
	for (lookup, table) in lookups.iter().zip(tables) {
		for &index in &lookup.writable_indexes {
			writable.push(table_entry(table, index)?);
		}
		for &index in &lookup.readonly_indexes {
			readonly.push(table_entry(table, index)?);
		}
	}

	let mut keys = Vec::with_capacity(static_keys.len() + writable.len() + readonly.len());
	keys.extend_from_slice(static_keys);
	keys.extend(writable);
	keys.extend(readonly);
	Ok(keys)
}

fn table_entry(table: &AddressLookupTableAccount, index: u8) -> Result<Pubkey, SponsorError> {
	table.addresses.get(usize::from(index)).copied().ok_or_else(|| {
		SponsorError::MalformedTransaction(format!(
			"lookup index {} out of range for table {} ({} entries)",
			index,
			table.key,
			table.addresses.len()
		))
	})
}

/// Signer and writable flags of one resolved account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountFlags {
	pub is_signer: bool,
	pub is_writable: bool,
}

/// Index boundaries derived from a message header.
///
/// Signers occupy `0..signed`, the first `writable_signed` of them writable.
/// Among the remaining accounts the first `writable_unsigned` are writable,
/// where `writable_unsigned = (resolved - signed) - readonly_unsigned`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountPermissions {
	signed: usize,
	writable_signed: usize,
	writable_unsigned: usize,
}

impl AccountPermissions {
	pub fn derive(header: &MessageHeader, resolved_len: usize) -> Result<Self, SponsorError> {
		let signed = usize::from(header.num_required_signatures);
		let readonly_signed = usize::from(header.num_readonly_signed_accounts);
		let readonly_unsigned = usize::from(header.num_readonly_unsigned_accounts);

		let writable_signed = signed.checked_sub(readonly_signed).ok_or_else(|| {
			SponsorError::MalformedTransaction(format!(
				"{} read-only signers but only {} signers",
				readonly_signed, signed
			))
		})?;
		let writable_unsigned = resolved_len
			.checked_sub(signed)
			.and_then(|unsigned| unsigned.checked_sub(readonly_unsigned))
			.ok_or_else(|| {
				SponsorError::MalformedTransaction(format!(
					"header counts exceed {} resolved accounts",
					resolved_len
				))
			})?;

		Ok(Self {
			signed,
			writable_signed,
			writable_unsigned,
		})
	}

	pub fn flags(&self, index: usize) -> AccountFlags {
		if index < self.signed {
			AccountFlags {
				is_signer: true,
				is_writable: index < self.writable_signed,
			}
		} else {
			AccountFlags {
				is_signer: false,
				is_writable: index - self.signed < self.writable_unsigned,
			}
		}
	}
}

/// Expands a compiled instruction against the resolved key list.
pub fn rebuild_instruction(
	compiled: &CompiledInstruction,
	keys: &[Pubkey],
	permissions: &AccountPermissions,
) -> Result<Instruction, SponsorError> {
	let key_at = |index: u8| {
		keys.get(usize::from(index)).copied().ok_or_else(|| {
			SponsorError::MalformedTransaction(format!(
				"account index {} out of range ({} accounts)",
				index,
				keys.len()
			))
		})
	};

	let program_id = key_at(compiled.program_id_index)?;
	let accounts = compiled
		.accounts
		.iter()
		.map(|&index| {
			let pubkey = key_at(index)?;
			let flags = permissions.flags(usize::from(index));
			Ok(AccountMeta {
				pubkey,
				is_signer: flags.is_signer,
				is_writable: flags.is_writable,
			})
		})
		.collect::<Result<Vec<_>, SponsorError>>()?;

	Ok(Instruction {
		program_id,
		accounts,
		data: compiled.data.clone(),
	})
}

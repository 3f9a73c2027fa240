//! Output columns and the built-in instructions for claim assessor reports.

pub const CLAIM_NUMBER_FIELD: &str = "ClaimNumber";
pub const SOURCE_FILE_COLUMN: &str = "SourceFile";
pub const NULL_PLACEHOLDER: &str = "null";
pub const PDF_MIME_TYPE: &str = "application/pdf";

pub const CLAIM_COLUMNS: [&str; 16] = [
    CLAIM_NUMBER_FIELD,
    "Insured",
    "PolicyType",
    "Incident",
    "Load",
    "Loading",
    "DateOfLoss",
    "Location",
    "ClaimCalculationTotal",
    "CargoOwner",
    "InsuranceCover",
    "AdequacyOfSumInsured",
    "Conveyances",
    "Driver",
    "CircumstancesOfClaim",
    "PoliceDetails",
];

/// Header row: every claim column followed by the provenance column.
pub fn header() -> Vec<String> {
    CLAIM_COLUMNS
        .iter()
        .chain(std::iter::once(&SOURCE_FILE_COLUMN))
        .map(|c| c.to_string())
        .collect()
}

pub const DEFAULT_INSTRUCTION: &str = r#"You extract information from insurance claim assessor reports.
Read the attached report and return the fields listed below. Do not invent information.
If a field is absent from the report, return "null" for it. If the report explains why a value is missing, return that explanation instead.
Output ONLY valid JSON: a single object with exactly the keys listed, or a list of such objects when the report describes several incidents.
Trim leading and trailing whitespace from every value.

Highlighted, bold or italic text is ordinary text. Keep extracting after a highlighted section.

Fields:
- ClaimNumber: the claim number. If there are several, use the first one.
- Insured: name of the insured party. If there are several, use the first one.
- PolicyType: type of insurance policy, without prefixes such as "GIT:".
- Incident: short description of the incident type.
- Load: description of the goods (e.g. "Tomatoes", "Electronics").
- Loading: weight of the load in kilograms ending in "kg" (e.g. "5000 kg"), or the stated reason it is missing.
- DateOfLoss: date of the loss as YYYY-MM-DD. May appear as "Date of Loss". If it is not a date, return what is written.
- Location: where the incident happened.
- ClaimCalculationTotal: final calculated claim value in Rand (e.g. "R 123,456.78"). May appear as "Calculation Final Value" or "Claim Total".
- CargoOwner: owner of the cargo.
- InsuranceCover: value of the insurance cover in Rand, or what the report says instead.
- AdequacyOfSumInsured: value of the load at the time of the incident in Rand, or what the report says instead.
- Conveyances: the first conveyance listed.
- Driver: name and surname of the driver.
- CircumstancesOfClaim: the paragraph describing the incident, without repetition, summarised as one clear sentence.
- PoliceDetails: police station and/or case reference, or what the report says instead.

Rules:
- Never skip a field.
- Each field is extracted from its own context only.
- Incident, DateOfLoss, Location, Conveyances, Driver and CircumstancesOfClaim may hold several values when the report describes several incidents.
- All money amounts use the Rand format "R 1,234.56".
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_ends_with_source_column() {
        let header = header();
        assert_eq!(header.len(), CLAIM_COLUMNS.len() + 1);
        assert_eq!(header[0], "ClaimNumber");
        assert_eq!(header.last().map(String::as_str), Some(SOURCE_FILE_COLUMN));
    }

    #[test]
    fn test_instruction_names_every_column() {
        for column in CLAIM_COLUMNS {
            assert!(DEFAULT_INSTRUCTION.contains(column), "missing {column}");
        }
    }
}

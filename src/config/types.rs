//! Rule table types.
//!
//! These types mirror the YAML files under `config/<tax-year>/`. Each tax
//! type has one file and one top-level struct with `uk`, `eu` and `us`
//! sections. Bracket and band tables validate themselves while they are
//! deserialised; the remaining cross-field checks run in
//! [`TaxTables::validate`].

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{EngineError, EngineResult};
use crate::models::{
    Amount, BandTable, BracketTable, CouncilArea, EuCountry, ExciseProduct, FilingStatus,
    InsuranceType, RateSchedule, TaxType, UsState,
};

/// Rules keyed by country or state, with a default for unspecified requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubRegionTable<K: Ord, T> {
    /// The entry used when a request names no sub-region.
    pub default: K,
    /// Rules per sub-region.
    pub entries: BTreeMap<K, T>,
}

impl<K, T> SubRegionTable<K, T>
where
    K: Ord + Copy + fmt::Display,
{
    /// Resolves a requested sub-region to its rules.
    ///
    /// A missing selector falls back to the default entry (and logs the
    /// fallback). A selector with no entry is an `UnsupportedRegion` error.
    pub fn resolve(&self, selector: Option<K>, tax: TaxType) -> EngineResult<(K, &T)> {
        let key = match selector {
            Some(key) => key,
            None => {
                warn!(tax = %tax, default = %self.default, "No sub-region given, using default");
                self.default
            }
        };
        self.entries
            .get(&key)
            .map(|entry| (key, entry))
            .ok_or_else(|| EngineError::UnsupportedRegion {
                tax: tax.name().to_string(),
                selector: key.to_string(),
            })
    }

    /// Returns true if the sub-region has rules.
    pub fn supports(&self, key: K) -> bool {
        self.entries.contains_key(&key)
    }

    fn check_default(&self, table: &str) -> EngineResult<()> {
        if self.entries.contains_key(&self.default) {
            Ok(())
        } else {
            Err(EngineError::InvalidBracketTable {
                message: format!("{}: default '{}' has no entry", table, self.default),
            })
        }
    }
}

/// One bracket table per US filing status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilingStatusTables {
    /// Single filers.
    pub single: BracketTable,
    /// Married filing jointly.
    pub married_joint: BracketTable,
    /// Head of household.
    pub head_of_household: BracketTable,
    /// Married filing separately.
    pub married_separate: BracketTable,
}

impl FilingStatusTables {
    /// Returns the table for a filing status.
    pub fn get(&self, status: FilingStatus) -> &BracketTable {
        match status {
            FilingStatus::Single => &self.single,
            FilingStatus::MarriedJoint => &self.married_joint,
            FilingStatus::HeadOfHousehold => &self.head_of_household,
            FilingStatus::MarriedSeparate => &self.married_separate,
        }
    }
}

/// `metadata.yaml`: describes the table set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TablesMetadata {
    /// Tax year label, e.g. "2024-25".
    pub tax_year: String,
    /// First day the tables apply.
    pub effective_from: NaiveDate,
    /// Where the figures come from.
    pub source: String,
    /// Caveats about the figures.
    #[serde(default)]
    pub notes: Vec<String>,
}

// --- income_tax.yaml -------------------------------------------------------

/// `income_tax.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomeTaxTables {
    /// UK income tax bands.
    pub uk: BracketTable,
    /// Income tax bands per EU country.
    pub eu: SubRegionTable<EuCountry, BracketTable>,
    /// US federal and state income tax.
    pub us: UsIncomeTaxTables,
}

/// US income tax tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsIncomeTaxTables {
    /// Federal brackets by filing status.
    pub federal: FilingStatusTables,
    /// State brackets; an empty table means no state income tax.
    pub states: SubRegionTable<UsState, BracketTable>,
}

// --- vat.yaml --------------------------------------------------------------

/// `vat.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VatTables {
    /// UK VAT rates.
    pub uk: UkVatRates,
    /// VAT rates per EU country.
    pub eu: SubRegionTable<EuCountry, EuVatRates>,
    /// Sales tax per US state.
    pub us: SubRegionTable<UsState, SalesTaxRates>,
}

/// UK VAT rates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UkVatRates {
    /// Standard rate.
    pub standard: Decimal,
    /// Reduced rate.
    pub reduced: Decimal,
    /// Zero rate.
    pub zero: Decimal,
}

/// VAT rates of one EU country.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EuVatRates {
    /// Standard rate.
    pub standard: Decimal,
    /// Reduced rate.
    pub reduced: Decimal,
    /// Super-reduced rate, where the country has one.
    #[serde(default)]
    pub super_reduced: Option<Decimal>,
}

/// Sales tax rates of one US state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesTaxRates {
    /// State-level rate.
    pub state_rate: Decimal,
    /// Average combined state and local rate.
    pub average_combined_rate: Decimal,
}

// --- capital_gains.yaml ----------------------------------------------------

/// `capital_gains.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapitalGainsTables {
    /// UK rules.
    pub uk: UkCapitalGains,
    /// Rules per EU country.
    pub eu: SubRegionTable<EuCountry, EuCapitalGains>,
    /// US long-term rates. Short-term gains use the federal income tax brackets.
    pub us: UsCapitalGains,
}

/// UK capital gains rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UkCapitalGains {
    /// Annual exempt amount.
    pub annual_exempt_amount: Decimal,
    /// Basic-rate taxpayer rate.
    pub basic_rate: Decimal,
    /// Higher-rate taxpayer rate.
    pub higher_rate: Decimal,
    /// Basic rate on residential property.
    pub residential_basic_rate: Decimal,
    /// Higher rate on residential property.
    pub residential_higher_rate: Decimal,
}

/// Capital gains rules of one EU country.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EuCapitalGains {
    /// Tax-free allowance deducted from the gain.
    #[serde(default)]
    pub allowance: Decimal,
    /// Rate applied to the rest.
    pub schedule: RateSchedule,
}

/// US capital gains tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsCapitalGains {
    /// Long-term rates by filing status.
    pub long_term: FilingStatusTables,
}

// --- inheritance_tax.yaml --------------------------------------------------

/// `inheritance_tax.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InheritanceTables {
    /// UK rules.
    pub uk: UkInheritance,
    /// Rules per EU country.
    pub eu: SubRegionTable<EuCountry, EuInheritance>,
    /// US federal estate tax.
    pub us: UsEstateTax,
}

/// UK inheritance tax rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UkInheritance {
    /// Nil-rate band.
    pub nil_rate_band: Decimal,
    /// Maximum residence nil-rate band.
    pub residence_nil_rate_band: Decimal,
    /// Estate value above which the residence band tapers away.
    pub residence_taper_threshold: Decimal,
    /// Rate on the estate above the allowances.
    pub rate: Decimal,
}

/// Exempt amounts per beneficiary relationship.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationshipAmounts {
    /// Spouse.
    pub spouse: Decimal,
    /// Child.
    pub child: Decimal,
    /// Sibling.
    pub sibling: Decimal,
    /// Anyone else.
    pub other: Decimal,
}

/// Inheritance tax rules of one EU country.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EuInheritance {
    /// Exemption by relationship.
    pub exemptions: RelationshipAmounts,
    /// Brackets applied above the exemption.
    pub brackets: BracketTable,
}

/// US federal estate tax rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsEstateTax {
    /// Federal exemption.
    pub exemption: Decimal,
    /// Brackets applied above the exemption.
    pub brackets: BracketTable,
    /// State for notes when none is given.
    pub default_state: UsState,
    /// Notes on state-level estate taxes, which are not calculated.
    #[serde(default)]
    pub state_notes: BTreeMap<UsState, String>,
}

// --- stamp_duty.yaml -------------------------------------------------------

/// `stamp_duty.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StampDutyTables {
    /// UK stamp duty land tax.
    pub uk: UkStampDuty,
    /// Transfer taxes per EU country.
    pub eu: SubRegionTable<EuCountry, PropertyTransferRates>,
    /// Transfer taxes per US state.
    pub us: SubRegionTable<UsState, PropertyTransferRates>,
}

/// UK stamp duty tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UkStampDuty {
    /// Standard residential bands.
    pub residential: BracketTable,
    /// Bands including the additional-property surcharge.
    pub additional_property: BracketTable,
    /// Non-residential bands.
    pub non_residential: BracketTable,
    /// First-time buyer relief bands.
    pub first_time_buyer: BracketTable,
    /// Highest price first-time buyer relief applies to.
    pub first_time_buyer_max_price: Decimal,
}

/// Transfer tax schedules by property type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyTransferRates {
    /// Schedule for residential property.
    pub residential: RateSchedule,
    /// Schedule for non-residential property.
    pub non_residential: RateSchedule,
    /// Caveat shown with the result.
    #[serde(default)]
    pub note: Option<String>,
}

// --- dividend_tax.yaml -----------------------------------------------------

/// `dividend_tax.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DividendTables {
    /// UK dividend bands.
    pub uk: BracketTable,
    /// Flat withholding rate per EU country.
    pub eu: SubRegionTable<EuCountry, Decimal>,
    /// US qualified dividend brackets by filing status.
    pub us: FilingStatusTables,
}

// --- national_insurance.yaml -----------------------------------------------

/// `national_insurance.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NationalInsuranceTables {
    /// UK national insurance.
    pub uk: UkNationalInsurance,
    /// Employee social security contributions per EU country.
    pub eu: SubRegionTable<EuCountry, Vec<Contribution>>,
    /// US FICA.
    pub us: UsFica,
}

/// UK national insurance rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UkNationalInsurance {
    /// Class 1 employee bands on annual earnings.
    pub class1: BracketTable,
    /// Class 2 weekly flat rate for the self-employed.
    pub class2_weekly_rate: Decimal,
    /// Weeks of class 2 charged per year.
    pub class2_weeks: Decimal,
    /// Profits above which class 2 is due.
    pub small_profits_threshold: Decimal,
    /// Class 4 bands on profits.
    pub class4: BracketTable,
}

/// One social security contribution line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contribution {
    /// Display label.
    pub label: String,
    /// Percentage rate.
    pub rate: Decimal,
    /// Earnings above this are not charged.
    #[serde(default)]
    pub ceiling: Option<Decimal>,
}

/// US FICA rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsFica {
    /// Employee social security rate.
    pub social_security_rate: Decimal,
    /// Wages above this are not charged social security.
    pub wage_base: Decimal,
    /// Employee Medicare rate.
    pub medicare_rate: Decimal,
    /// Additional Medicare rate.
    pub additional_medicare_rate: Decimal,
    /// Wages above which additional Medicare applies.
    pub additional_medicare_threshold: Decimal,
}

// --- vehicle_tax.yaml ------------------------------------------------------

/// `vehicle_tax.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleTaxTables {
    /// UK vehicle excise duty.
    pub uk: UkVehicleTax,
    /// Annual vehicle tax method per EU country.
    pub eu: SubRegionTable<EuCountry, EuVehicleRule>,
    /// Purchase tax and registration per US state.
    pub us: SubRegionTable<UsState, UsVehicleRates>,
}

/// First-year and standard VED amounts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VedRates {
    /// Charged in the first year of registration.
    pub first_year: Decimal,
    /// Charged in later years.
    pub standard: Decimal,
}

/// UK VED tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UkVehicleTax {
    /// CO2 bands for petrol cars.
    pub petrol: BandTable<VedRates>,
    /// CO2 bands for diesel cars.
    pub diesel: BandTable<VedRates>,
    /// CO2 bands for hybrid and alternative fuel cars.
    pub alternative: BandTable<VedRates>,
    /// Electric cars.
    pub electric: VedRates,
}

/// US vehicle purchase rates for one state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsVehicleRates {
    /// Sales tax percentage on new vehicles.
    pub sales_tax_rate: Decimal,
    /// Annual registration fee.
    pub registration_fee: Decimal,
}

/// How one EU country charges annual vehicle tax.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum EuVehicleRule {
    /// Per 100cc of engine displacement plus a CO2 component.
    Displacement {
        /// Rate per 100cc for petrol engines.
        petrol_rate_per_100cc: Decimal,
        /// Rate per 100cc for other engines.
        diesel_rate_per_100cc: Decimal,
        /// Emissions above this are charged.
        co2_threshold: Decimal,
        /// Rate per g/km above the threshold.
        co2_rate: Decimal,
    },
    /// Fixed amount by CO2 band.
    Co2Bands {
        /// The bands.
        bands: BandTable<Amount>,
    },
    /// Fixed amount by fiscal horsepower, converted from kW.
    Horsepower {
        /// Horsepower per kW.
        hp_per_kw: Decimal,
        /// The bands, by horsepower.
        bands: BandTable<Amount>,
    },
    /// Per kW with a surcharge above a power threshold.
    Power {
        /// Rate per kW.
        rate_per_kw: Decimal,
        /// Power above which the surcharge applies.
        surcharge_threshold_kw: Decimal,
        /// Surcharge per kW above the threshold.
        surcharge_per_kw: Decimal,
        /// Percentage discount for electric vehicles.
        electric_discount: Decimal,
    },
    /// Base amount by fuel plus a weight component.
    Weight {
        /// Base for petrol and other non-diesel vehicles.
        petrol_base: Decimal,
        /// Base for diesel vehicles.
        diesel_base: Decimal,
        /// Rate per 100kg.
        rate_per_100kg: Decimal,
    },
    /// Scaled square root of engine displacement, with a minimum.
    FiscalHorsepower {
        /// Multiplier applied to the square root of the displacement.
        factor: Decimal,
        /// Rate per fiscal horsepower.
        rate: Decimal,
        /// Minimum charge.
        minimum: Decimal,
    },
    /// Base amount plus a CO2 component, scaled for new vehicles.
    Co2Base {
        /// Base amount.
        base: Decimal,
        /// Emissions above this are charged.
        co2_threshold: Decimal,
        /// Rate per g/km above the threshold.
        co2_rate: Decimal,
        /// Multiplier for new non-electric vehicles.
        new_vehicle_multiplier: Decimal,
        /// Flat amount for electric vehicles.
        electric_amount: Decimal,
    },
}

// --- property_tax.yaml -----------------------------------------------------

/// `property_tax.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyTaxTables {
    /// UK council tax.
    pub uk: UkCouncilTax,
    /// Annual property tax per EU country.
    pub eu: EuPropertyTax,
    /// Effective property tax rate (% of value) per US state.
    pub us: SubRegionTable<UsState, Decimal>,
}

/// A council tax band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouncilBand {
    /// Band letter.
    pub band: String,
    /// Annual charge before area adjustment.
    pub annual_charge: Decimal,
}

/// UK council tax rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UkCouncilTax {
    /// Bands by property value.
    pub bands: BandTable<CouncilBand>,
    /// Charge multiplier per area type.
    pub areas: SubRegionTable<CouncilArea, Decimal>,
}

/// EU property tax rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EuPropertyTax {
    /// Percentage discount for a primary residence.
    pub primary_residence_discount: Decimal,
    /// Rules per country.
    pub countries: SubRegionTable<EuCountry, EuPropertyRule>,
}

/// How one EU country charges annual property tax.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum EuPropertyRule {
    /// A percentage of the property value.
    Percentage {
        /// Percentage rate.
        rate: Decimal,
    },
    /// A fixed charge by value band.
    ValueBands {
        /// The bands.
        bands: BandTable<Amount>,
    },
    /// The same charge whatever the value.
    Fixed {
        /// The annual charge.
        amount: Decimal,
        /// What the charge covers.
        #[serde(default)]
        description: Option<String>,
    },
}

// --- insurance_premium_tax.yaml --------------------------------------------

/// `insurance_premium_tax.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsurancePremiumTables {
    /// UK insurance premium tax.
    pub uk: UkInsurancePremium,
    /// Rates per EU country.
    pub eu: SubRegionTable<EuCountry, EuInsurancePremium>,
    /// Premium tax per US state.
    pub us: SubRegionTable<UsState, UsInsurancePremium>,
}

/// UK insurance premium tax rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UkInsurancePremium {
    /// Standard rate.
    pub standard_rate: Decimal,
    /// Higher rate.
    pub higher_rate: Decimal,
    /// Policies charged at the higher rate.
    pub higher_rate_types: Vec<InsuranceType>,
    /// Policies exempt from the tax.
    pub exempt_types: Vec<InsuranceType>,
}

/// Insurance premium tax rules of one EU country.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EuInsurancePremium {
    /// Rate for policies without a special rate.
    pub standard_rate: Decimal,
    /// Rates for specific policy types.
    #[serde(default)]
    pub special_rates: BTreeMap<InsuranceType, Decimal>,
    /// Policies exempt from the tax.
    #[serde(default)]
    pub exempt_types: Vec<InsuranceType>,
}

/// Premium tax rules of one US state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsInsurancePremium {
    /// Premium tax rate.
    pub rate: Decimal,
    /// The state charges no premium tax at all.
    #[serde(default)]
    pub exempt_all: bool,
    /// Policies exempt from the tax.
    #[serde(default)]
    pub exempt_types: Vec<InsuranceType>,
}

// --- excise_duty.yaml ------------------------------------------------------

/// `excise_duty.yaml`: duty basis per product, per region.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExciseTables {
    /// UK duties.
    pub uk: BTreeMap<ExciseProduct, DutyBasis>,
    /// EU minimum duties.
    pub eu: BTreeMap<ExciseProduct, DutyBasis>,
    /// US federal duties.
    pub us: BTreeMap<ExciseProduct, DutyBasis>,
}

/// The unit a duty rate is expressed in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "basis", rename_all = "snake_case")]
pub enum DutyBasis {
    /// Per litre of pure alcohol: litres × ABV.
    PerLitrePureAlcohol {
        /// Rate per litre of pure alcohol.
        rate: Decimal,
    },
    /// Per container of a fixed volume.
    PerContainer {
        /// Rate per container.
        rate: Decimal,
        /// Litres per container.
        litres: Decimal,
        /// Container name, e.g. "75cl bottle".
        container: String,
    },
    /// Per proof gallon: gallons × ABV × 2 / 100.
    PerProofGallon {
        /// Rate per proof gallon.
        rate: Decimal,
    },
    /// Specific duty per 1,000 items plus a percentage of retail price.
    Composite {
        /// Rate per 1,000 items.
        per_thousand: Decimal,
        /// Percentage of retail price.
        ad_valorem_rate: Decimal,
    },
    /// Per pack of a fixed size.
    PerPack {
        /// Rate per pack.
        rate: Decimal,
        /// Items per pack.
        pack_size: Decimal,
    },
    /// Per 1,000 items.
    PerThousand {
        /// Rate per 1,000 items.
        rate: Decimal,
    },
    /// Per kilogram, from a quantity in grams.
    PerKilogram {
        /// Rate per kilogram.
        rate: Decimal,
    },
    /// Per pound, from a quantity in grams.
    PerPound {
        /// Rate per pound.
        rate: Decimal,
    },
    /// Per litre.
    PerLitre {
        /// Rate per litre.
        rate: Decimal,
    },
    /// Per US gallon, from a quantity in litres.
    PerGallon {
        /// Rate per gallon.
        rate: Decimal,
    },
    /// A percentage of the declared value.
    PercentOfValue {
        /// Percentage rate.
        rate: Decimal,
    },
}

// --- sole_trader.yaml ------------------------------------------------------

/// `sole_trader.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoleTraderTables {
    /// UK rules. Income tax and NIC come from their own tables.
    pub uk: UkSoleTrader,
    /// Rules per EU country.
    pub eu: SubRegionTable<EuCountry, EuSoleTrader>,
    /// US self-employment tax. Income tax uses the federal tables.
    pub us: UsSelfEmployment,
}

/// UK sole trader rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UkSoleTrader {
    /// Percentage of turnover allowed as simplified expenses.
    pub simplified_expense_rate: Decimal,
}

/// US self-employment tax rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsSelfEmployment {
    /// Social security rate on net earnings.
    pub social_security_rate: Decimal,
    /// Earnings above this are not charged social security.
    pub wage_base: Decimal,
    /// Medicare rate on net earnings.
    pub medicare_rate: Decimal,
    /// Percentage of self-employment tax deductible from income.
    pub deductible_share: Decimal,
}

/// Sole trader rules of one EU country.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EuSoleTrader {
    /// Income tax brackets on profit.
    pub income_tax: BracketTable,
    /// Social security percentage of profit.
    pub social_security_rate: Decimal,
    /// Upper limit on social security contributions.
    #[serde(default)]
    pub social_security_cap: Option<Decimal>,
    /// Special treatment available in the country.
    #[serde(default)]
    pub note: Option<String>,
}

// --- business_sale.yaml ----------------------------------------------------

/// `business_sale.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessSaleTables {
    /// UK rules.
    pub uk: UkBusinessSale,
    /// Rules per EU country.
    pub eu: SubRegionTable<EuCountry, EuBusinessSale>,
    /// US rules.
    pub us: UsBusinessSale,
}

/// UK business sale rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UkBusinessSale {
    /// Annual exempt amount.
    pub annual_exempt_amount: Decimal,
    /// Basic-rate taxpayer rate.
    pub basic_rate: Decimal,
    /// Higher-rate taxpayer rate.
    pub higher_rate: Decimal,
    /// Business Asset Disposal Relief rate.
    pub relief_rate: Decimal,
    /// Lifetime limit of gains taxed at the relief rate.
    pub relief_lifetime_limit: Decimal,
    /// Minimum years of ownership for the relief.
    pub relief_min_years: Decimal,
}

/// US long-term rates by income level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomeLevelRates {
    /// Low income.
    pub low: Decimal,
    /// Medium income.
    pub medium: Decimal,
    /// High income.
    pub high: Decimal,
}

/// US business sale rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsBusinessSale {
    /// Rate for assets held less than `long_term_min_years`.
    pub short_term_rate: Decimal,
    /// Holding period for long-term treatment.
    pub long_term_min_years: Decimal,
    /// Long-term rates.
    pub long_term_rates: IncomeLevelRates,
    /// Percentage of gain excluded for qualified small business stock.
    pub qsbs_exclusion: Decimal,
    /// Holding period for the QSBS exclusion.
    pub qsbs_min_years: Decimal,
}

/// A relief available on a business sale in an EU country.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EuRelief {
    /// Name of the relief.
    pub name: String,
    /// Rate when the relief applies.
    pub rate: Decimal,
    /// Conditions for the relief.
    pub requirements: String,
}

/// Business sale rules of one EU country.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EuBusinessSale {
    /// Rate without relief.
    pub basic_rate: Decimal,
    /// Relief, if the country offers one.
    #[serde(default)]
    pub relief: Option<EuRelief>,
    /// Other special provisions.
    #[serde(default)]
    pub provisions: Option<String>,
}

/// The complete set of rule tables for one tax year.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxTables {
    /// Table set metadata.
    pub metadata: TablesMetadata,
    /// Income tax.
    pub income_tax: IncomeTaxTables,
    /// VAT and sales tax.
    pub vat: VatTables,
    /// Capital gains tax.
    pub capital_gains: CapitalGainsTables,
    /// Inheritance and estate tax.
    pub inheritance_tax: InheritanceTables,
    /// Stamp duty and transfer tax.
    pub stamp_duty: StampDutyTables,
    /// Dividend tax.
    pub dividend_tax: DividendTables,
    /// National insurance and social security.
    pub national_insurance: NationalInsuranceTables,
    /// Vehicle tax.
    pub vehicle_tax: VehicleTaxTables,
    /// Council and property tax.
    pub property_tax: PropertyTaxTables,
    /// Insurance premium tax.
    pub insurance_premium_tax: InsurancePremiumTables,
    /// Excise duty.
    pub excise_duty: ExciseTables,
    /// Sole trader tax.
    pub sole_trader: SoleTraderTables,
    /// Business sale tax.
    pub business_sale: BusinessSaleTables,
}

impl TaxTables {
    /// Checks the invariants serde cannot: every sub-region table's default
    /// must have an entry.
    pub fn validate(&self) -> EngineResult<()> {
        self.income_tax.eu.check_default("income_tax.eu")?;
        self.income_tax.us.states.check_default("income_tax.us.states")?;
        self.vat.eu.check_default("vat.eu")?;
        self.vat.us.check_default("vat.us")?;
        self.capital_gains.eu.check_default("capital_gains.eu")?;
        self.inheritance_tax.eu.check_default("inheritance_tax.eu")?;
        self.stamp_duty.eu.check_default("stamp_duty.eu")?;
        self.stamp_duty.us.check_default("stamp_duty.us")?;
        self.dividend_tax.eu.check_default("dividend_tax.eu")?;
        self.national_insurance.eu.check_default("national_insurance.eu")?;
        self.vehicle_tax.eu.check_default("vehicle_tax.eu")?;
        self.vehicle_tax.us.check_default("vehicle_tax.us")?;
        self.property_tax.uk.areas.check_default("property_tax.uk.areas")?;
        self.property_tax.eu.countries.check_default("property_tax.eu.countries")?;
        self.property_tax.us.check_default("property_tax.us")?;
        self.insurance_premium_tax.eu.check_default("insurance_premium_tax.eu")?;
        self.insurance_premium_tax.us.check_default("insurance_premium_tax.us")?;
        self.sole_trader.eu.check_default("sole_trader.eu")?;
        self.business_sale.eu.check_default("business_sale.eu")?;

        let duties = [
            ("excise_duty.uk", &self.excise_duty.uk),
            ("excise_duty.eu", &self.excise_duty.eu),
            ("excise_duty.us", &self.excise_duty.us),
        ];
        for (table, duties) in duties {
            for (product, basis) in duties {
                let divisor = match basis {
                    DutyBasis::PerContainer { litres, .. } => Some(litres),
                    DutyBasis::PerPack { pack_size, .. } => Some(pack_size),
                    _ => None,
                };
                if divisor.is_some_and(|d| *d <= Decimal::ZERO) {
                    return Err(EngineError::InvalidBracketTable {
                        message: format!("{}: {} has a non-positive unit size", table, product),
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn rates() -> SubRegionTable<EuCountry, Decimal> {
        serde_yaml::from_str("default: germany\nentries:\n  germany: 26.375\n  france: 30\n").unwrap()
    }

    #[test]
    fn test_resolve_named_sub_region() {
        let table = rates();
        let (key, rate) = table.resolve(Some(EuCountry::France), TaxType::DividendTax).unwrap();
        assert_eq!(key, EuCountry::France);
        assert_eq!(*rate, dec("30"));
    }

    #[test]
    fn test_resolve_missing_selector_uses_default() {
        let table = rates();
        let (key, rate) = table.resolve(None, TaxType::DividendTax).unwrap();
        assert_eq!(key, EuCountry::Germany);
        assert_eq!(*rate, dec("26.375"));
    }

    #[test]
    fn test_resolve_unlisted_sub_region_is_unsupported() {
        let table = rates();
        let result = table.resolve(Some(EuCountry::Sweden), TaxType::DividendTax);
        match result {
            Err(EngineError::UnsupportedRegion { tax, selector }) => {
                assert_eq!(tax, "dividend tax");
                assert_eq!(selector, "Sweden");
            }
            other => panic!("Expected UnsupportedRegion, got {:?}", other),
        }
    }

    #[test]
    fn test_default_without_entry_fails_check() {
        let table: SubRegionTable<EuCountry, Decimal> =
            serde_yaml::from_str("default: italy\nentries:\n  germany: 26.375\n").unwrap();
        assert!(table.check_default("dividend_tax.eu").is_err());
    }

    #[test]
    fn test_filing_status_tables_select_by_status() {
        let yaml = "single: [{ min: 0, rate: 10 }]\n\
                    married_joint: [{ min: 0, rate: 11 }]\n\
                    head_of_household: [{ min: 0, rate: 12 }]\n\
                    married_separate: [{ min: 0, rate: 13 }]\n";
        let tables: FilingStatusTables = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(tables.get(FilingStatus::HeadOfHousehold).brackets()[0].rate, dec("12"));
    }

    #[test]
    fn test_duty_basis_tagged_by_basis() {
        let basis: DutyBasis =
            serde_yaml::from_str("basis: composite\nper_thousand: 262.90\nad_valorem_rate: 16.5\n")
                .unwrap();
        assert_eq!(
            basis,
            DutyBasis::Composite {
                per_thousand: dec("262.90"),
                ad_valorem_rate: dec("16.5"),
            }
        );
    }
}

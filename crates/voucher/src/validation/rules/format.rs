//! Value format rules: data types, ranges, patterns, vocabularies and URLs.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::schema::{Attribute, Config, DataType, Entity};
use crate::validation::EntityMessages;

use super::{entity_has_attribute, persistable, require_column, RuleContext, RuleLevel};

static INT_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[+-]?\d*$").unwrap());
static FLOAT_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[+-]?\d*\.\d*$").unwrap());
static URI_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z0-9+=:._()~*]+$").unwrap());
static NUMBER_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+\.?\d*|\.\d+)$").unwrap());

// what an exported date/time value parses as when no dataFormat matches
const ISO_DATE: &str = "%Y-%m-%d";
const ISO_TIME: &str = "%H:%M:%S%.3f";
const ISO_DATETIME: &str = "%Y-%m-%dT%H:%M:%S%.3f";

/// Every non-string attribute value must parse under the attribute's
/// declared [`DataType`]. Always runs at ERROR level; failing records are
/// excluded from persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ValidDataTypeFormatRule {
    pub level: RuleLevel,
    pub network_rule: bool,
}

impl Default for ValidDataTypeFormatRule {
    fn default() -> Self {
        ValidDataTypeFormatRule {
            level: RuleLevel::Error,
            network_rule: false,
        }
    }
}

impl ValidDataTypeFormatRule {
    const GROUP: &'static str = "Invalid DataFormat";

    pub fn run(&self, ctx: &mut RuleContext<'_>, messages: &mut EntityMessages) -> bool {
        let mut valid = true;
        let mark_errors = self.level == RuleLevel::Error;
        let attributes = ctx.entity.attributes.clone();

        for r in persistable(ctx.records) {
            for a in &attributes {
                let value = r.get(&a.uri).to_string();

                if value.is_empty() {
                    continue;
                }

                let message = match a.data_type {
                    DataType::Integer if !is_integer(&value, a) => Some(
                        with_sentinel_hint(
                            format!("\"{}\" contains non-integer value \"{value}\"", a.column),
                            a,
                        ),
                    ),
                    DataType::Float if !is_float(&value, a) => Some(
                        with_sentinel_hint(
                            format!("\"{}\" contains non-float value \"{value}\"", a.column),
                            a,
                        ),
                    ),
                    DataType::Date | DataType::Time | DataType::Datetime
                        if !is_temporal(&value, a) =>
                    {
                        Some(with_sentinel_hint(
                            format!(
                                "\"{}\" contains invalid date value \"{value}\". Format must be one of [{}]",
                                a.column,
                                a.data_format.as_deref().unwrap_or_default()
                            ),
                            a,
                        ))
                    }
                    DataType::Boolean if !value.eq_ignore_ascii_case("true")
                        && !value.eq_ignore_ascii_case("false") =>
                    {
                        Some(format!(
                            "\"{}\" contains non-boolean value \"{value}\". Must be either true or false",
                            a.column
                        ))
                    }
                    _ => None,
                };

                if let Some(msg) = message {
                    messages.add_message(Self::GROUP, msg, self.level);
                    valid = false;
                    if mark_errors {
                        r.set_error();
                    }
                }
            }
        }

        valid
    }

    pub fn valid_configuration(
        &self,
        _messages: &mut Vec<String>,
        _entity: &Entity,
        _config: &Config,
    ) -> bool {
        true
    }
}

fn with_sentinel_hint(msg: String, attribute: &Attribute) -> String {
    let mut allowed = Vec::new();
    if attribute.allow_unknown {
        allowed.push("\"Unknown\"");
    }
    if attribute.allow_tbd {
        allowed.push("\"TBD\" or \"to be determined\"");
    }
    if allowed.is_empty() {
        msg
    } else {
        format!("{msg}. Value can also be {}", allowed.join(" or "))
    }
}

fn allowed_sentinel(value: &str, attribute: &Attribute) -> bool {
    (attribute.allow_unknown && Attribute::is_unknown_value(value))
        || (attribute.allow_tbd && Attribute::is_tbd_value(value))
}

fn is_integer(value: &str, attribute: &Attribute) -> bool {
    INT_PATTERN.is_match(value) || allowed_sentinel(value, attribute)
}

fn is_float(value: &str, attribute: &Attribute) -> bool {
    INT_PATTERN.is_match(value)
        || FLOAT_PATTERN.is_match(value)
        || allowed_sentinel(value, attribute)
}

fn is_temporal(value: &str, attribute: &Attribute) -> bool {
    if allowed_sentinel(value, attribute) {
        return true;
    }

    let fallback = match attribute.data_type {
        DataType::Date => ISO_DATE,
        DataType::Time => ISO_TIME,
        _ => ISO_DATETIME,
    };
    let declared = attribute.data_format.as_deref().unwrap_or_default();
    let formats = declared.split(',').map(str::trim).chain([fallback]);

    for format in formats {
        if format.is_empty() {
            continue;
        }
        let ok = match attribute.data_type {
            DataType::Date => NaiveDate::parse_from_str(value, format).is_ok(),
            DataType::Time => NaiveTime::parse_from_str(value, format).is_ok(),
            _ => NaiveDateTime::parse_from_str(value, format).is_ok(),
        };
        if ok {
            return true;
        }
    }
    false
}

/// Values in `column` must survive embedding into a URI without encoding.
///
/// Required for columns whose values become identifier segments; the rule
/// checks a restricted character set rather than full URI syntax.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ValidForUriRule {
    pub column: String,
    pub level: RuleLevel,
    pub network_rule: bool,
}

impl ValidForUriRule {
    const GROUP: &'static str = "Non-valid URI characters";

    pub fn new(column: impl Into<String>, level: RuleLevel) -> Self {
        ValidForUriRule {
            column: column.into(),
            level,
            network_rule: false,
        }
    }

    pub fn run(&self, ctx: &mut RuleContext<'_>, messages: &mut EntityMessages) -> bool {
        let Some(uri) = ctx.entity.attribute_uri(&self.column) else {
            return false;
        };

        let mut invalid = Vec::new();

        // empty values fail too: an identifier segment must be present
        for r in ctx.records.iter() {
            let value = r.get(uri);

            if !URI_CHARS.is_match(value) {
                invalid.push(value.to_string());
            }
        }

        if invalid.is_empty() {
            return true;
        }

        messages.add_message(
            Self::GROUP,
            format!(
                "\"{}\" contains some invalid URI characters: \"{}\"",
                self.column,
                invalid.join("\", \"")
            ),
            self.level,
        );
        false
    }

    pub fn valid_configuration(
        &self,
        messages: &mut Vec<String>,
        entity: &Entity,
        _config: &Config,
    ) -> bool {
        require_column(messages, &self.column, "ValidForURI")
            && entity_has_attribute(messages, entity, &self.column, "ValidForURI")
    }
}

/// Values in `column` must come from the config list named `listName`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ControlledVocabularyRule {
    pub column: String,
    pub list_name: String,
    pub level: RuleLevel,
    pub network_rule: bool,
}

impl ControlledVocabularyRule {
    const GROUP: &'static str = "Unapproved value(s)";

    pub fn new(column: impl Into<String>, list_name: impl Into<String>, level: RuleLevel) -> Self {
        ControlledVocabularyRule {
            column: column.into(),
            list_name: list_name.into(),
            level,
            network_rule: false,
        }
    }

    pub fn run(&self, ctx: &mut RuleContext<'_>, messages: &mut EntityMessages) -> bool {
        let Some(uri) = ctx.entity.attribute_uri(&self.column) else {
            return false;
        };
        let Some(list) = ctx.config.find_list(&self.list_name) else {
            return false;
        };

        let mut invalid = indexmap::IndexSet::new();

        for r in ctx.records.iter().filter(|r| r.persist()) {
            let value = r.get(uri);

            if !value.is_empty() && !list.contains_value(value) {
                invalid.insert(value.to_string());
            }
        }

        if invalid.is_empty() {
            return true;
        }

        for value in invalid {
            messages.add_message(
                Self::GROUP,
                format!(
                    "\"{value}\" in column \"{}\" not in list \"{}\"",
                    self.column, self.list_name
                ),
                self.level,
            );
        }
        false
    }

    pub fn valid_configuration(
        &self,
        messages: &mut Vec<String>,
        entity: &Entity,
        config: &Config,
    ) -> bool {
        let valid = require_column(messages, &self.column, "ControlledVocabulary")
            && entity_has_attribute(messages, entity, &self.column, "ControlledVocabulary");

        if self.list_name.trim().is_empty() {
            messages.push(
                "Invalid ControlledVocabulary Rule configuration. listName must not be blank."
                    .to_string(),
            );
            return false;
        }

        if config.find_list(&self.list_name).is_none() {
            messages.push(format!(
                "Invalid Project configuration. Could not find list with name \"{}\"",
                self.list_name
            ));
            return false;
        }

        valid
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RangeOp {
    GreaterThan,
    GreaterThanEquals,
    LessThan,
    LessThanEquals,
}

/// Numeric values in `column` must satisfy every bound in the range string,
/// e.g. `">=-90|<=90"` or simply `">0"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct NumericRangeRule {
    pub column: String,
    pub range: String,
    pub level: RuleLevel,
    pub network_rule: bool,
}

impl NumericRangeRule {
    const GROUP: &'static str = "Invalid number format";

    pub fn new(column: impl Into<String>, range: impl Into<String>, level: RuleLevel) -> Self {
        NumericRangeRule {
            column: column.into(),
            range: range.into(),
            level,
            network_rule: false,
        }
    }

    fn parse_range(&self) -> Option<Vec<(RangeOp, f64)>> {
        let mut bounds = Vec::new();

        for part in self.range.split('|') {
            let part = part.trim();
            let (op, rest) = if let Some(rest) = part.strip_prefix(">=") {
                (RangeOp::GreaterThanEquals, rest)
            } else if let Some(rest) = part.strip_prefix("<=") {
                (RangeOp::LessThanEquals, rest)
            } else if let Some(rest) = part.strip_prefix('>') {
                (RangeOp::GreaterThan, rest)
            } else if let Some(rest) = part.strip_prefix('<') {
                (RangeOp::LessThan, rest)
            } else {
                return None;
            };

            bounds.push((op, rest.trim().parse::<f64>().ok()?));
        }

        Some(bounds)
    }

    pub fn run(&self, ctx: &mut RuleContext<'_>, messages: &mut EntityMessages) -> bool {
        let Some(uri) = ctx.entity.attribute_uri(&self.column) else {
            return false;
        };
        let Some(bounds) = self.parse_range() else {
            return false;
        };
        let allow_unknown = ctx
            .entity
            .attribute(&self.column)
            .map(|a| a.allow_unknown)
            .unwrap_or(false);

        let mut invalid = Vec::new();

        for r in ctx.records.iter().filter(|r| r.persist()) {
            let value = r.get(uri);

            if value.is_empty() {
                continue;
            }

            match value.parse::<f64>() {
                Ok(n) => {
                    let out_of_range = bounds.iter().any(|(op, bound)| match op {
                        RangeOp::GreaterThanEquals => n < *bound,
                        RangeOp::GreaterThan => n <= *bound,
                        RangeOp::LessThanEquals => n > *bound,
                        RangeOp::LessThan => n >= *bound,
                    });
                    if out_of_range {
                        invalid.push(value.to_string());
                    }
                }
                Err(_) => {
                    if !(allow_unknown && Attribute::is_unknown_value(value)) {
                        invalid.push(value.to_string());
                    }
                }
            }
        }

        if invalid.is_empty() {
            return true;
        }

        for value in invalid {
            messages.add_message(
                Self::GROUP,
                format!(
                    "Value \"{value}\" out of range for \"{}\" using range validation = \"{}\"",
                    self.column, self.range
                ),
                self.level,
            );
        }
        false
    }

    pub fn valid_configuration(
        &self,
        messages: &mut Vec<String>,
        entity: &Entity,
        _config: &Config,
    ) -> bool {
        let valid = require_column(messages, &self.column, "NumericRange")
            && entity_has_attribute(messages, entity, &self.column, "NumericRange");

        if self.range.trim().is_empty() {
            messages.push(
                "Invalid NumericRange Rule configuration. range must not be blank.".to_string(),
            );
            return false;
        }

        if self.parse_range().is_none() {
            messages.push(format!(
                "Invalid NumericRange Rule configuration. Could not parse range \"{}\"",
                self.range
            ));
            return false;
        }

        valid
    }
}

/// `minimumColumn` and `maximumColumn` must both hold numbers, with minimum
/// less than or equal to maximum on every row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct MinMaxNumberRule {
    pub minimum_column: String,
    pub maximum_column: String,
    pub level: RuleLevel,
    pub network_rule: bool,
}

impl MinMaxNumberRule {
    const GROUP: &'static str = "Number outside of range";

    pub fn new(
        minimum_column: impl Into<String>,
        maximum_column: impl Into<String>,
        level: RuleLevel,
    ) -> Self {
        MinMaxNumberRule {
            minimum_column: minimum_column.into(),
            maximum_column: maximum_column.into(),
            level,
            network_rule: false,
        }
    }

    pub fn run(&self, ctx: &mut RuleContext<'_>, messages: &mut EntityMessages) -> bool {
        let Some(min_uri) = ctx.entity.attribute_uri(&self.minimum_column) else {
            return false;
        };
        let Some(max_uri) = ctx.entity.attribute_uri(&self.maximum_column) else {
            return false;
        };

        let mut valid = true;

        for r in ctx.records.iter().filter(|r| r.persist()) {
            let min_value = r.get(min_uri);
            let max_value = r.get(max_uri);

            if min_value.is_empty() && max_value.is_empty() {
                continue;
            }

            let mut numbers_ok = true;
            if !min_value.is_empty() && !NUMBER_PATTERN.is_match(min_value) {
                messages.add_message(
                    Self::GROUP,
                    format!(
                        "non-numeric value \"{min_value}\" for column \"{}\"",
                        self.minimum_column
                    ),
                    self.level,
                );
                numbers_ok = false;
                valid = false;
            }
            if !max_value.is_empty() && !NUMBER_PATTERN.is_match(max_value) {
                messages.add_message(
                    Self::GROUP,
                    format!(
                        "non-numeric value \"{max_value}\" for column \"{}\"",
                        self.maximum_column
                    ),
                    self.level,
                );
                numbers_ok = false;
                valid = false;
            }

            if numbers_ok && !min_value.is_empty() && !max_value.is_empty() {
                if let (Ok(min), Ok(max)) = (min_value.parse::<f64>(), max_value.parse::<f64>()) {
                    if min > max {
                        messages.add_message(
                            Self::GROUP,
                            format!(
                                "Illegal values! {} = {min_value} while {} = {max_value}",
                                self.minimum_column, self.maximum_column
                            ),
                            self.level,
                        );
                        valid = false;
                    }
                }
            }
        }

        valid
    }

    pub fn valid_configuration(
        &self,
        messages: &mut Vec<String>,
        entity: &Entity,
        _config: &Config,
    ) -> bool {
        if self.minimum_column.trim().is_empty() || self.maximum_column.trim().is_empty() {
            messages.push(
                "Invalid MinMaxNumber Rule configuration. minimumColumn and maximumColumn must not be blank"
                    .to_string(),
            );
            return false;
        }

        entity_has_attribute(messages, entity, &self.minimum_column, "MinMaxNumber")
            && entity_has_attribute(messages, entity, &self.maximum_column, "MinMaxNumber")
    }
}

/// Values in `column` must match the given pattern. The pattern is anchored
/// before matching if the config did not anchor it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct RegExpRule {
    pub column: String,
    pub pattern: String,
    pub case_insensitive: bool,
    pub level: RuleLevel,
    pub network_rule: bool,
}

impl RegExpRule {
    const GROUP: &'static str = "Value constraint did not pass";

    pub fn new(
        column: impl Into<String>,
        pattern: impl Into<String>,
        case_insensitive: bool,
        level: RuleLevel,
    ) -> Self {
        RegExpRule {
            column: column.into(),
            pattern: pattern.into(),
            case_insensitive,
            level,
            network_rule: false,
        }
    }

    fn compile(&self) -> Option<Regex> {
        let mut p = self.pattern.clone();
        if !p.starts_with('^') {
            p.insert(0, '^');
        }
        if !p.ends_with('$') {
            p.push('$');
        }
        RegexBuilder::new(&p)
            .case_insensitive(self.case_insensitive)
            .build()
            .ok()
    }

    pub fn run(&self, ctx: &mut RuleContext<'_>, messages: &mut EntityMessages) -> bool {
        let Some(uri) = ctx.entity.attribute_uri(&self.column).map(str::to_string) else {
            return false;
        };
        let Some(pattern) = self.compile() else {
            return false;
        };

        let mut invalid = indexmap::IndexSet::new();
        let mark_errors = self.level == RuleLevel::Error;

        for r in persistable(ctx.records) {
            let value = r.get(&uri).to_string();

            if value.is_empty() {
                continue;
            }

            if !pattern.is_match(&value) {
                invalid.insert(value);
                if mark_errors {
                    r.set_error();
                }
            }
        }

        if invalid.is_empty() {
            return true;
        }

        for value in invalid {
            messages.add_message(
                Self::GROUP,
                format!(
                    "Value \"{value}\" in column \"{}\" does not match the pattern \"{}\"",
                    self.column, self.pattern
                ),
                self.level,
            );
        }
        false
    }

    pub fn valid_configuration(
        &self,
        messages: &mut Vec<String>,
        entity: &Entity,
        _config: &Config,
    ) -> bool {
        let valid = require_column(messages, &self.column, "RegExp")
            && entity_has_attribute(messages, entity, &self.column, "RegExp");

        if self.pattern.trim().is_empty() {
            messages.push("Invalid RegExp Rule configuration. pattern must not be blank.".to_string());
            return false;
        }

        if self.compile().is_none() {
            messages.push(format!(
                "Invalid RegExp Rule configuration. Could not compile pattern \"{}\"",
                self.pattern
            ));
            return false;
        }

        valid
    }
}

/// Every value in `column` must be a valid http(s) URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ValidUrlRule {
    pub column: String,
    pub level: RuleLevel,
    pub network_rule: bool,
}

impl ValidUrlRule {
    const GROUP: &'static str = "Invalid URL";

    pub fn new(column: impl Into<String>, level: RuleLevel) -> Self {
        ValidUrlRule {
            column: column.into(),
            level,
            network_rule: false,
        }
    }

    fn is_valid_url(value: &str) -> bool {
        match Url::parse(value) {
            Ok(url) => matches!(url.scheme(), "http" | "https") && url.has_host(),
            Err(_) => false,
        }
    }

    pub fn run(&self, ctx: &mut RuleContext<'_>, messages: &mut EntityMessages) -> bool {
        let Some(uri) = ctx.entity.attribute_uri(&self.column) else {
            return false;
        };

        let mut invalid = Vec::new();

        for r in ctx.records.iter() {
            let value = r.get(uri);

            if !value.is_empty() && !Self::is_valid_url(value) {
                invalid.push(value.to_string());
            }
        }

        if invalid.is_empty() {
            return true;
        }

        for value in invalid {
            messages.add_message(
                Self::GROUP,
                format!("\"{value}\" is not a valid URL for \"{}\"", self.column),
                self.level,
            );
        }
        false
    }

    pub fn valid_configuration(
        &self,
        messages: &mut Vec<String>,
        entity: &Entity,
        _config: &Config,
    ) -> bool {
        require_column(messages, &self.column, "ValidURL")
            && entity_has_attribute(messages, entity, &self.column, "ValidURL")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_and_float_patterns() {
        let plain = Attribute::new("yearCollected", "urn:yearCollected");

        assert!(is_integer("42", &plain));
        assert!(is_integer("-7", &plain));
        assert!(!is_integer("4.2", &plain));
        assert!(!is_integer("abc", &plain));

        assert!(is_float("4.2", &plain));
        assert!(is_float("-0.5", &plain));
        assert!(is_float("42", &plain));
        assert!(!is_float("4.2.1", &plain));
    }

    #[test]
    fn sentinel_values_honor_the_attribute_flags() {
        let mut a = Attribute::new("yearCollected", "urn:yearCollected");
        assert!(!is_integer("Unknown", &a));
        assert!(!is_integer("TBD", &a));

        a.allow_unknown = true;
        assert!(is_integer("Unknown", &a));
        assert!(!is_integer("TBD", &a));

        a.allow_tbd = true;
        assert!(is_integer("TBD", &a));
        assert!(is_integer("to be determined", &a));
        assert!(is_float("TBD", &a));

        let mut d = Attribute::new("eventDate", "urn:eventDate");
        d.data_type = DataType::Date;
        d.allow_tbd = true;
        assert!(is_temporal("TBD", &d));
        assert!(!is_temporal("later", &d));
    }

    #[test]
    fn sentinel_hint_names_the_allowed_values() {
        let mut a = Attribute::new("yearCollected", "urn:yearCollected");
        assert_eq!(with_sentinel_hint("bad".to_string(), &a), "bad");

        a.allow_tbd = true;
        assert_eq!(
            with_sentinel_hint("bad".to_string(), &a),
            "bad. Value can also be \"TBD\" or \"to be determined\""
        );

        a.allow_unknown = true;
        assert_eq!(
            with_sentinel_hint("bad".to_string(), &a),
            "bad. Value can also be \"Unknown\" or \"TBD\" or \"to be determined\""
        );
    }

    #[test]
    fn temporal_parsing_uses_declared_and_iso_formats() {
        let mut a = Attribute::new("eventDate", "urn:eventDate");
        a.data_type = DataType::Date;
        a.data_format = Some("%d/%m/%Y".to_string());

        assert!(is_temporal("25/12/2020", &a));
        // ISO fallback always accepted
        assert!(is_temporal("2020-12-25", &a));
        assert!(!is_temporal("12-25-2020", &a));
    }

    #[test]
    fn numeric_range_parsing() {
        let rule = NumericRangeRule::new("lat", ">=-90|<=90", RuleLevel::Error);
        let bounds = rule.parse_range().unwrap();
        assert_eq!(bounds.len(), 2);
        assert_eq!(bounds[0], (RangeOp::GreaterThanEquals, -90.0));
        assert_eq!(bounds[1], (RangeOp::LessThanEquals, 90.0));

        let bad = NumericRangeRule::new("lat", "90-180", RuleLevel::Error);
        assert!(bad.parse_range().is_none());
    }

    #[test]
    fn regexp_anchors_pattern() {
        let rule = RegExpRule::new("col", "[a-z]+", false, RuleLevel::Warning);
        let re = rule.compile().unwrap();
        assert!(re.is_match("abc"));
        assert!(!re.is_match("abc1"));

        let ci = RegExpRule::new("col", "yes|no", true, RuleLevel::Warning);
        let re = ci.compile().unwrap();
        assert!(re.is_match("YES"));
    }

    #[test]
    fn url_validation() {
        assert!(ValidUrlRule::is_valid_url("https://example.com/page"));
        assert!(ValidUrlRule::is_valid_url("http://example.com"));
        assert!(!ValidUrlRule::is_valid_url("ftp://example.com"));
        assert!(!ValidUrlRule::is_valid_url("example.com"));
        assert!(!ValidUrlRule::is_valid_url("not a url"));
    }

    #[test]
    fn uri_character_set() {
        assert!(URI_CHARS.is_match("CBS_123.4"));
        assert!(!URI_CHARS.is_match("CBS 123"));
        assert!(!URI_CHARS.is_match("a/b"));
        assert!(!URI_CHARS.is_match(""));
    }
}

//! Documentation content for the pipette CLI

use super::CliError;

/// Available documentation categories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocCategory {
    Pipelines,
    Match,
    Group,
    Ordering,
    Reshape,
    Types,
    Input,
}

impl DocCategory {
    /// Parse category name from string; a leading `$` is ignored so stage
    /// names work too
    pub fn from_name(s: &str) -> Option<Self> {
        let name = s.trim_start_matches('$').to_lowercase().replace('_', "-");
        match name.as_str() {
            "pipelines" | "pipeline" | "stages" => Some(Self::Pipelines),
            "match" | "filter" | "regex" | "all" => Some(Self::Match),
            "group" | "accumulators" | "sum" | "avg" | "push" => Some(Self::Group),
            "ordering" | "sort" | "limit" | "skip" | "count" => Some(Self::Ordering),
            "reshape" | "project" | "unwind" | "addfields" | "add-fields" | "set" => {
                Some(Self::Reshape)
            }
            "types" | "type" | "values" => Some(Self::Types),
            "input" | "output" | "io" => Some(Self::Input),
            _ => None,
        }
    }
}

/// Get the docs overview (category listing)
pub fn get_docs_overview() -> &'static str {
    r#"PIPETTE DOCUMENTATION

pipette runs MongoDB-style aggregation pipelines over a collection of JSON
documents. A pipeline is a JSON array of stages; each stage consumes the
documents produced by the previous one.

DOCUMENTATION CATEGORIES

  pipelines         Pipeline literals, field references and stage validation
  match             $match predicates: equality, comparisons, $all, $regex
  group             $group keys and the $sum, $avg, $push, $min, $max, $first accumulators
  ordering          $sort, $limit, $skip and $count
  reshape           $project, $unwind and $addFields
  types             Value types, missing fields and the cross-type sort order
  input             Input formats, output formats and exit codes

QUICK REFERENCE

  "$field"          Field reference (dotted paths reach into sub-documents)
  {"$match": {...}} Keep matching documents
  {"$group": {...}} Aggregate per key
  {"$sort": {...}}  Stable multi-key sort
  {"$count": "n"}   Count documents

Run 'pipette doc <category>' for detailed documentation.
"#
}

/// Get documentation for a specific category
pub fn get_doc_category(name: &str) -> Result<&'static str, CliError> {
    match DocCategory::from_name(name) {
        Some(DocCategory::Pipelines) => Ok(PIPELINES_DOC),
        Some(DocCategory::Match) => Ok(MATCH_DOC),
        Some(DocCategory::Group) => Ok(GROUP_DOC),
        Some(DocCategory::Ordering) => Ok(ORDERING_DOC),
        Some(DocCategory::Reshape) => Ok(RESHAPE_DOC),
        Some(DocCategory::Types) => Ok(TYPES_DOC),
        Some(DocCategory::Input) => Ok(INPUT_DOC),
        None => Err(CliError::UnknownCategory(name.to_string())),
    }
}

const PIPELINES_DOC: &str = r#"PIPELINES - Stage Literals and Field References

PIPELINE
  [ <stage>, <stage>, ... ]
    A JSON array. Each stage is an object with exactly one key naming the
    stage kind. An empty array returns the collection unchanged.

    Example:
      [
        {"$match": {"isActive": true}},
        {"$count": "activeUsers"}
      ]

FIELD REFERENCES
  "$field"
  "$company.location.country"
    A string starting with $ refers to a field of the current document.
    Dots walk into sub-documents; numeric segments index into arrays.

    Constraints:
      - Segments must not be empty ("$a..b" is rejected)
      - Referring to a field that is not present yields "missing",
        which is different from null

VALIDATION
  Every stage is checked before any document is read. A malformed stage is
  reported with its position and nothing is printed:

    $ pipette check '[{"$limit": 1}, {"$sort": {}}]'
    stage 1: invalid $sort stage: at least one sort key is required

SUPPORTED STAGES
  $match  $group  $sort  $limit  $skip  $count
  $project  $unwind  $addFields ($set)
"#;

const MATCH_DOC: &str = r#"MATCH - Filtering Documents

EQUALITY
  {"$match": {"gender": "female"}}
    Keeps documents whose field equals the value. If the field holds an
    array, one equal element is enough. A missing field never matches.

COMPARISONS
  {"$match": {"age": {"$gte": 21, "$lt": 30}}}
    $eq $ne $gt $gte $lt $lte compare values of the same type class only:
    numbers with numbers, strings with strings, dates with dates.

    Operators:
      $in  [...]     Equal to any listed value
      $nin [...]     Equal to none (holds for missing fields)
      $exists bool   Presence test; null counts as present

ALL
  {"$match": {"tags": {"$all": ["enim", "id"]}}}
    The field must be an array containing every listed value.

REGEX
  {"$match": {"company.phone": {"$regex": "\\+1 \\(940\\)"}}}
    Tests string fields only. Patterns are anchored at the start of the
    string. $options accepts i, m, s and x.

COMBINING
  Several fields in one $match must all hold. Use consecutive $match stages
  for readability; the result is the same.
"#;

const GROUP_DOC: &str = r#"GROUP - Aggregating per Key

KEY
  {"$group": {"_id": <key>, <name>: {<accumulator>}, ...}}

    _id forms:
      null                          One group for the whole input
      "$favoriteFruit"              Group by a field (missing groups under null)
      {"$year": "$registered"}      Calendar year of a date field
      {"$month": "$registered"}     Month 1-12 (also $dayOfMonth)
      {"eye": "$eyeColor", "y": {"$year": "$registered"}}
                                    Compound key

    Groups are emitted in the order their key was first seen. Each result
    document has _id first, then the accumulators as written.

ACCUMULATORS
  {"$sum": 1}                 Count documents
  {"$sum": "$age"}            Total of a numeric field; non-numbers are skipped
  {"$avg": "$age"}            Mean, excluding missing or null values
  {"$avg": {"$ifNull": ["$age", 0]}}
                              Mean, counting missing or null as 0
  {"$push": "$name"}          All present values, in input order
  {"$min": "$age"}            Smallest value (nulls ignored)
  {"$max": "$age"}            Largest value (nulls ignored)
  {"$first": "$name"}         Value from the first document in the group

  Sums of integers stay integers. Sums and averages use exact decimal
  arithmetic, so 0.1 + 0.2 totals 0.3. Totals beyond the decimal range
  continue as floats.

  An $avg over a group with no usable values is null.

EXAMPLE
  [
    {"$group": {"_id": "$gender", "genderCount": {"$sum": 1}}}
  ]
  -> {"_id": "male", "genderCount": 2}
     {"_id": "female", "genderCount": 1}
"#;

const ORDERING_DOC: &str = r#"ORDERING - Sort, Limit, Skip and Count

SORT
  {"$sort": {"count": -1, "_id": 1}}
    1 ascending, -1 descending. The first key is primary. The sort is
    stable: documents that compare equal keep their input order.

    Missing fields sort before null in ascending order and after
    everything in descending order. See 'pipette doc types'.

LIMIT
  {"$limit": 5}
    Keep the first 5 documents. 0 or a negative value keeps none.

SKIP
  {"$skip": 10}
    Drop the first 10 documents. 0 or a negative value drops none.

COUNT
  {"$count": "activeUsers"}
    Replace the input with a single document {"activeUsers": <n>}. An
    empty input yields {"activeUsers": 0}.

    The name must be non-empty, must not start with $ and must not contain
    a dot.
"#;

const RESHAPE_DOC: &str = r#"RESHAPE - Project, Unwind and AddFields

PROJECT
  {"$project": {"name": 1, "company.location.country": 1}}
    Keep only the listed fields. Missing fields are left out. _id is kept
    only when listed; "_id": 0 is accepted and has no effect.

    Constraints:
      - Excluding any field other than _id is rejected
      - Computed projections are not supported; use $addFields first

UNWIND
  {"$unwind": "$tags"}
  {"$unwind": {"path": "$tags"}}
    One output document per array element, with the field replaced by the
    element. Documents whose field is missing, null or [] are dropped. A
    present non-array value passes through unchanged.

ADDFIELDS
  {"$addFields": {"numberOfTags": {"$size": {"$ifNull": ["$tags", []]}}}}
    Set computed fields and keep everything else. $set is an alias.

    Expressions:
      "$field"                      Copy a field (missing stays missing)
      {"$size": "$tags"}            Array length; 0 for missing or non-arrays
      {"$size": {"$ifNull": ["$tags", [..]]}}
                                    Length of the default array when missing/null
      {"$ifNull": ["$f", <v>]}      Field value, or <v> when missing/null
      {"$year": "$registered"}      Date parts ($month, $dayOfMonth too)
      {"$literal": <v>}             A constant, even one starting with $
      <any other JSON>              A constant

    All expressions in one stage see the incoming document.
"#;

const TYPES_DOC: &str = r#"TYPES - Values and Ordering

VALUE TYPES
  null, boolean, integer, float, string, date, array, object

  Integers and floats compare as numbers: 1 equals 1.0 and both land in
  the same group.

DATES
  Written as extended JSON in both input and output:
    {"$date": "2015-02-11T04:22:39.000Z"}
    {"$date": 1423628559000}          (milliseconds since the epoch)

  Offsets without a colon (+0000) are accepted on input.

MISSING VS NULL
  A field that is not present is "missing". Missing and null differ:
    - $exists: true holds for null, not for missing
    - $push collects null but skips missing
    - $sort places missing before null

CROSS-TYPE SORT ORDER (ascending)
  missing < null < numbers < strings < objects < arrays < booleans < dates
"#;

const INPUT_DOC: &str = r#"INPUT - Running Pipelines

RUN
  pipette run <PIPELINE> [--input FILE] [--pretty] [--jsonl]

    <PIPELINE> is inline JSON, or a path to a .json, .yaml or .yml file
    holding the stage array.

    The collection is read from --input or stdin, either as a JSON array
    of objects or as JSON Lines (one object per line).

  Output is a JSON array. --pretty indents it (also PIPETTE_PRETTY=1);
  --jsonl prints one compact document per line instead.

CHECK
  pipette check <PIPELINE>
    Validate a pipeline without reading any input.

LOGGING
  Diagnostics go to stderr. RUST_LOG controls the level (default warn);
  --verbose raises it to debug.

EXIT CODES
  0   Success
  1   Invalid pipeline, unreadable input or I/O failure
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_names_resolve_to_categories() {
        assert_eq!(DocCategory::from_name("$group"), Some(DocCategory::Group));
        assert_eq!(DocCategory::from_name("addFields"), Some(DocCategory::Reshape));
        assert_eq!(DocCategory::from_name("SORT"), Some(DocCategory::Ordering));
    }

    #[test]
    fn unknown_category_is_an_error() {
        assert!(matches!(
            get_doc_category("lookup"),
            Err(CliError::UnknownCategory(name)) if name == "lookup"
        ));
    }
}

use asxdb_core::Company;

/// The company with the oldest `last_refreshed`; ties go to the lowest code.
#[must_use]
pub fn select_stalest(companies: &[Company]) -> Option<&Company> {
    companies
        .iter()
        .min_by(|a, b| (a.last_refreshed, &a.code).cmp(&(b.last_refreshed, &b.code)))
}

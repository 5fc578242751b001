use crate::catalog::Host;

pub fn filter_hosts<'a>(hosts: &'a [Host], query: &str) -> Vec<&'a Host> {
    if query.is_empty() {
        return hosts.iter().collect();
    }
    let needle = query.to_lowercase();
    hosts
        .iter()
        .filter(|host| host.name.to_lowercase().contains(&needle))
        .collect()
}

// Left column takes the extra host when the count is odd.
pub fn split_columns<T>(visible: &[T]) -> (&[T], &[T]) {
    let mid = (visible.len() + 1) / 2;
    visible.split_at(mid)
}

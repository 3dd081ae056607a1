/// A macro for advisory read-through caching of recommendation results.
///
/// Checks the cache for the given key; on a hit the cached value is returned
/// as-is. On a miss (or when no cache is configured, or the cache read
/// fails) the provided block computes the value, which is then written back
/// in the background. The cache is advisory: a Redis failure degrades to a
/// recompute, it never fails the request.
///
/// # Arguments
/// * `$cache`: an `&Option<Cache>`; `None` disables caching entirely.
/// * `$key`: the `CacheKey` to read and write.
/// * `$ttl`: time-to-live for the written value, in seconds.
/// * `$block`: the future computing the value on a miss.
///
/// # Example
/// ```rust,ignore
/// let candidates: Vec<Candidate> = cached!(&state.cache, key, ttl, async {
///     state.engine.recommend(&user_id, limit).await
/// })?;
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let cache: &Option<$crate::db::Cache> = $cache;

        let hit = match cache {
            Some(c) => c.get_from_cache(&$key).await.unwrap_or_else(|e| {
                tracing::warn!(error = %e, key = %$key, "Cache read failed, recomputing");
                None
            }),
            None => None,
        };

        match hit {
            Some(value) => Ok::<_, $crate::error::AppError>(value),
            None => {
                // Not cached (or cache unavailable): compute and write back
                let value = $block.await?;
                if let Some(c) = cache {
                    c.set_in_background(&$key, &value, $ttl);
                }
                Ok(value)
            }
        }
    }};
}

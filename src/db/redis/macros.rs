/// Read-through caching over an optional Redis cache.
///
/// When the cache is present and holds the key, the cached value is returned.
/// Otherwise the block is awaited, its value is queued for storage and returned.
/// Cache read failures are logged and treated as misses.
///
/// # Arguments
/// * `$cache`: an `Option<&Cache>`
/// * `$key`: the `CacheKey` to read and write
/// * `$ttl`: time-to-live for the stored value in seconds
/// * `$block`: future computing the value on a miss, yielding `AppResult<T>`
///
/// # Example
/// ```rust,ignore
/// let recs: Vec<Recommendation> = cached!(state.cache.as_ref(), key, 3600, async move {
///     compute_recommendations().await
/// })?;
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let cache: Option<&$crate::db::Cache> = $cache;
        let key = &$key;

        let hit = match cache {
            Some(cache) => match cache.get_from_cache(key).await {
                Ok(hit) => hit,
                Err(e) => {
                    tracing::warn!(error = %e, key = %key, "Cache read failed, computing value");
                    None
                }
            },
            None => None,
        };

        match hit {
            Some(value) => {
                tracing::debug!(key = %key, "Cache hit");
                Ok(value)
            }
            None => match $block.await {
                Ok(value) => {
                    if let Some(cache) = cache {
                        cache.set_in_background(key, &value, $ttl);
                    }
                    Ok(value)
                }
                Err(e) => Err(e),
            },
        }
    }};
}

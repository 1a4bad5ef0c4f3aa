//! Site registry operations.

use super::connection::SiteDb;
use crate::Error;
use crate::fingerprint::Fingerprint;
use crate::site::{MonitoredSite, SiteKind, SiteSeed};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

type SiteRow = (i64, String, String, Option<String>, Option<String>);

fn into_site((id, url, tag, hash, updated_at): SiteRow) -> Result<MonitoredSite, Error> {
    let kind = tag
        .parse::<SiteKind>()
        .map_err(|_| Error::UnknownSiteKind { url: url.clone(), tag })?;
    Ok(MonitoredSite { id, url, kind, last_content_hash: hash.map(Fingerprint::from_stored), hash_updated_at: updated_at })
}

impl SiteDb {
    /// Insert every seed whose URL is not registered yet.
    ///
    /// Returns the number of rows inserted; running it again inserts nothing.
    pub async fn seed(&self, seeds: &[SiteSeed]) -> Result<usize, Error> {
        let seeds = seeds.to_vec();
        self.session(move |conn| -> Result<usize, Error> {
            let tx = conn.transaction()?;
            let mut inserted = 0;
            for seed in &seeds {
                inserted += tx.execute(
                    "INSERT INTO websites (url, scraper_type) VALUES (?1, ?2)
                     ON CONFLICT(url) DO NOTHING",
                    params![seed.url, seed.kind.as_str()],
                )?;
            }
            tx.commit()?;
            Ok(inserted)
        })
        .await
    }

    /// All monitored sites in registry order.
    ///
    /// Fails with [`Error::UnknownSiteKind`] if any row carries a tag no
    /// extractor handles.
    pub async fn list_sites(&self) -> Result<Vec<MonitoredSite>, Error> {
        self.session(|conn| -> Result<Vec<MonitoredSite>, Error> {
            let mut stmt = conn.prepare(
                "SELECT id, url, scraper_type, last_content_hash, hash_updated_at
                 FROM websites ORDER BY id ASC",
            )?;
            let rows = stmt
                .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?)))?
                .collect::<Result<Vec<SiteRow>, _>>()?;

            rows.into_iter().map(into_site).collect()
        })
        .await
    }

    /// Look up a single site by URL.
    pub async fn get_site(&self, url: &str) -> Result<Option<MonitoredSite>, Error> {
        let url = url.to_string();
        self.session(move |conn| -> Result<Option<MonitoredSite>, Error> {
            let result = conn.query_row(
                "SELECT id, url, scraper_type, last_content_hash, hash_updated_at
                 FROM websites WHERE url = ?1",
                params![url],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?)),
            );

            match result {
                Ok(row) => into_site(row).map(Some),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
    }

    /// Last-known fingerprint of the site at `url`, if any.
    pub async fn get_fingerprint(&self, url: &str) -> Result<Option<Fingerprint>, Error> {
        let url = url.to_string();
        self.session(move |conn| -> Result<Option<Fingerprint>, Error> {
            let result = conn.query_row(
                "SELECT last_content_hash FROM websites WHERE url = ?1",
                params![url],
                |row| row.get::<_, Option<String>>(0),
            );

            match result {
                Ok(hash) => Ok(hash.map(Fingerprint::from_stored)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
    }

    /// Record `fingerprint` as the last-known content of the site at `url`.
    ///
    /// Returns `false` when no site with that URL is registered.
    pub async fn set_fingerprint(&self, url: &str, fingerprint: &Fingerprint) -> Result<bool, Error> {
        let url = url.to_string();
        let hash = fingerprint.as_str().to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.session(move |conn| -> Result<bool, Error> {
            let tx = conn.transaction()?;
            let updated = tx.execute(
                "UPDATE websites SET last_content_hash = ?1, hash_updated_at = ?2 WHERE url = ?3",
                params![hash, now, url],
            )?;
            tx.commit()?;
            Ok(updated > 0)
        })
        .await
    }

    /// Number of registered sites.
    pub async fn count_sites(&self) -> Result<u64, Error> {
        self.session(|conn| -> Result<u64, Error> {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM websites", [], |row| row.get(0))?;
            Ok(count as u64)
        })
        .await
    }
}

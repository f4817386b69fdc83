//! Fetch-and-persist loop: securities → chunks → pages → appended records.

use super::progress::{FetchProgress, ProgressEntry, RunReport, SecurityOutcome};
use super::provider::{FetchError, PageProvider, PageQuery, FIRST_PAGE};
use super::store::{AnnouncementStore, AnnouncementWriter};
use crate::domain::{DateChunk, SecurityId};

/// Fetch every chunk of every security, appending each page to the
/// security's collection as soon as it arrives.
///
/// Securities run one after another in the order given. A failure stops the
/// rest of that security's chunks but not the securities after it; whatever
/// was written before the failure stays on disk.
pub fn fetch_announcements(
    provider: &dyn PageProvider,
    store: &AnnouncementStore,
    securities: &[SecurityId],
    chunks: &[DateChunk],
    progress: &dyn FetchProgress,
) -> RunReport {
    let total = securities.len();
    let mut report = RunReport::default();

    for (i, security) in securities.iter().enumerate() {
        progress.on_security_start(security, i, total);

        let mut records = 0;
        let result = fetch_security(
            provider,
            store,
            security,
            chunks,
            progress,
            &mut report.log,
            &mut records,
        );

        let entry = match &result {
            Ok(()) => ProgressEntry::SecurityCompleted {
                isin: security.isin.clone(),
                records,
            },
            Err(e) => ProgressEntry::SecurityFailed {
                isin: security.isin.clone(),
                records,
                error: e.to_string(),
            },
        };
        push_entry(&mut report.log, progress, entry);

        report.outcomes.push(SecurityOutcome {
            security: security.clone(),
            records,
            error: result.err(),
        });
    }

    report
}

/// First-page request for every (security, chunk) pair, without any I/O.
pub fn plan_requests(
    provider: &dyn PageProvider,
    securities: &[SecurityId],
    chunks: &[DateChunk],
) -> Vec<(SecurityId, DateChunk, String)> {
    let page_size = provider.page_size();
    securities
        .iter()
        .flat_map(|security| {
            chunks.iter().map(move |&chunk| {
                let query = PageQuery {
                    security,
                    chunk,
                    page: FIRST_PAGE,
                    page_size,
                };
                (security.clone(), chunk, provider.describe(&query))
            })
        })
        .collect()
}

/// One security: open its collection, then walk the chunks in order.
///
/// The writer lives only inside this function, so the file is closed on
/// every exit path before the next security starts.
fn fetch_security(
    provider: &dyn PageProvider,
    store: &AnnouncementStore,
    security: &SecurityId,
    chunks: &[DateChunk],
    progress: &dyn FetchProgress,
    log: &mut Vec<ProgressEntry>,
    records: &mut usize,
) -> Result<(), FetchError> {
    let mut writer = store.open(&security.isin)?;

    for &chunk in chunks {
        let mut chunk_records = 0;
        let result = fetch_chunk(
            provider,
            &mut writer,
            security,
            chunk,
            progress,
            &mut chunk_records,
        );
        *records += chunk_records;

        match result {
            Ok(()) => push_entry(
                log,
                progress,
                ProgressEntry::ChunkCompleted {
                    isin: security.isin.clone(),
                    chunk,
                    records: chunk_records,
                },
            ),
            Err(e) => {
                push_entry(
                    log,
                    progress,
                    ProgressEntry::ChunkFailed {
                        isin: security.isin.clone(),
                        chunk,
                        records: chunk_records,
                        error: e.to_string(),
                    },
                );
                return Err(e);
            }
        }
    }

    writer.finish()?;
    Ok(())
}

/// Page through one chunk until an empty or short page.
///
/// A full final page costs one extra request that comes back empty.
fn fetch_chunk(
    provider: &dyn PageProvider,
    writer: &mut AnnouncementWriter,
    security: &SecurityId,
    chunk: DateChunk,
    progress: &dyn FetchProgress,
    written: &mut usize,
) -> Result<(), FetchError> {
    let page_size = provider.page_size();
    let mut page_no = FIRST_PAGE;

    loop {
        let query = PageQuery {
            security,
            chunk,
            page: page_no,
            page_size,
        };
        let page = provider.fetch_page(&query)?;
        if page.is_empty() {
            return Ok(());
        }

        writer.append_page(&page.records)?;
        *written += page.len();
        progress.on_page(security, &chunk, page_no, page.len());

        if page.is_last(page_size) {
            return Ok(());
        }
        page_no += 1;
    }
}

fn push_entry(log: &mut Vec<ProgressEntry>, progress: &dyn FetchProgress, entry: ProgressEntry) {
    progress.on_entry(&entry);
    log.push(entry);
}

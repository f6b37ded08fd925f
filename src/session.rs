//! # 会话层
//!
//! ## 设计思路
//!
//! `ProcessorSession` 是一次处理会话的显式所有者：持有处理器与 `CollectionStore`，
//! 生命周期由调用方管理，不使用全局状态。
//!
//! 上传可能并发完成，但写入存储必须严格按“发起上传”的顺序进行，
//! 因为替换 / 追加 / 截断这几种操作不可交换。
//!
//! ## 实现思路
//!
//! - `begin_upload` 在发起时分配递增序号（`UploadTicket`），凭证持有共享状态的句柄。
//! - `complete_upload` 把结果放入待应用队列，只把从 `next_to_apply` 开始连续的结果写入存储；
//!   失败的上传同样占用序号，推进队列但不改动存储。
//! - 凭证未提交就被丢弃（调用方提前返回、任务 panic、批量上传被取消）时，
//!   在 `Drop` 中按失败提交，序号队列不会卡住。
//! - 结果直接返回给触发写入的那次调用；只有 `upload_batch` 正在等待的序号
//!   才会暂存到 `finished`，等待方退出时一并清理。

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::Notify;
use tokio::task::JoinSet;

use crate::error::AppError;
use crate::image_processor::{FittedImage, ImageError, ImageProcessor, ImageSource};
use crate::store::{AcceptOutcome, CollectionStore, ExportedImage, SlotKind};

/// 已按顺序应用到存储的一次上传。
#[derive(Debug)]
pub struct AppliedUpload {
    pub seq: u64,
    pub slot: SlotKind,
    pub outcome: Result<AcceptOutcome, AppError>,
}

struct SessionState {
    store: CollectionStore,
    next_ticket: u64,
    next_to_apply: u64,
    pending: BTreeMap<u64, (SlotKind, Result<FittedImage, AppError>)>,
    /// 有等待方的序号，应用后转入 `finished`。
    awaited: HashSet<u64>,
    finished: BTreeMap<u64, AppliedUpload>,
}

impl SessionState {
    fn drain_ready(&mut self) -> (Vec<AppliedUpload>, usize) {
        let mut returned = Vec::new();
        let mut parked = 0;
        while let Some((slot, result)) = self.pending.remove(&self.next_to_apply) {
            let seq = self.next_to_apply;
            let outcome = match result {
                Ok(image) => self.store.accept(slot, image).map_err(AppError::from),
                Err(err) => {
                    log::warn!("⚠️ 上传 #{} ({}) 被拒绝：{}", seq, slot, err);
                    Err(err)
                }
            };
            let applied = AppliedUpload { seq, slot, outcome };
            if self.awaited.remove(&seq) {
                self.finished.insert(seq, applied);
                parked += 1;
            } else {
                returned.push(applied);
            }
            self.next_to_apply += 1;
        }
        (returned, parked)
    }
}

struct SessionShared {
    state: Mutex<SessionState>,
    notify: Notify,
}

impl SessionShared {
    fn lock_state(&self) -> Result<MutexGuard<'_, SessionState>, AppError> {
        self.state
            .lock()
            .map_err(|_| AppError::State("会话状态锁已中毒".to_string()))
    }

    fn complete(
        &self,
        seq: u64,
        slot: SlotKind,
        result: Result<FittedImage, AppError>,
    ) -> Result<Vec<AppliedUpload>, AppError> {
        let (returned, parked) = {
            let mut state = self.lock_state()?;
            state.pending.insert(seq, (slot, result));
            state.drain_ready()
        };

        if parked > 0 {
            self.notify.notify_waiters();
        }
        if returned.is_empty() && parked == 0 {
            log::debug!("⏳ 上传 #{} 已完成，等待前序上传", seq);
        }
        Ok(returned)
    }
}

/// 一次上传的序号凭证。
///
/// 只能提交一次；未提交就被丢弃时按失败处理。
pub struct UploadTicket {
    seq: u64,
    slot: SlotKind,
    shared: Arc<SessionShared>,
    completed: bool,
}

impl UploadTicket {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn slot(&self) -> SlotKind {
        self.slot
    }

    fn finish(mut self, result: Result<FittedImage, AppError>) -> Result<Vec<AppliedUpload>, AppError> {
        self.completed = true;
        self.shared.complete(self.seq, self.slot, result)
    }
}

impl fmt::Debug for UploadTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadTicket")
            .field("seq", &self.seq)
            .field("slot", &self.slot)
            .field("completed", &self.completed)
            .finish()
    }
}

impl Drop for UploadTicket {
    fn drop(&mut self) {
        if self.completed {
            return;
        }
        log::warn!("⚠️ 上传 #{} ({}) 未提交即被丢弃，按失败处理", self.seq, self.slot);
        let abandoned = Err(AppError::State(format!("上传 #{} 已被放弃", self.seq)));
        if let Err(err) = self.shared.complete(self.seq, self.slot, abandoned) {
            log::error!("❌ 无法记录被放弃的上传 #{}：{}", self.seq, err);
        }
    }
}

/// `upload_batch` 退出（含被取消）时撤销等待登记，丢弃暂存结果。
struct AwaitGuard<'a> {
    shared: &'a SessionShared,
    seqs: Vec<u64>,
}

impl Drop for AwaitGuard<'_> {
    fn drop(&mut self) {
        let Ok(mut state) = self.shared.state.lock() else {
            return;
        };
        for seq in &self.seqs {
            state.awaited.remove(seq);
            state.finished.remove(seq);
        }
    }
}

pub struct ProcessorSession {
    processor: ImageProcessor,
    shared: Arc<SessionShared>,
}

impl Default for ProcessorSession {
    fn default() -> Self {
        Self::new(ImageProcessor::default())
    }
}

impl ProcessorSession {
    pub fn new(processor: ImageProcessor) -> Self {
        Self {
            processor,
            shared: Arc::new(SessionShared {
                state: Mutex::new(SessionState {
                    store: CollectionStore::new(),
                    next_ticket: 0,
                    next_to_apply: 0,
                    pending: BTreeMap::new(),
                    awaited: HashSet::new(),
                    finished: BTreeMap::new(),
                }),
                notify: Notify::new(),
            }),
        }
    }

    pub fn processor(&self) -> &ImageProcessor {
        &self.processor
    }

    fn issue_ticket(&self, slot: SlotKind, awaited: bool) -> Result<UploadTicket, AppError> {
        let mut state = self.shared.lock_state()?;
        let seq = state.next_ticket;
        state.next_ticket += 1;
        if awaited {
            state.awaited.insert(seq);
        }
        Ok(UploadTicket {
            seq,
            slot,
            shared: Arc::clone(&self.shared),
            completed: false,
        })
    }

    /// 发起一次上传，分配序号。
    pub fn begin_upload(&self, slot: SlotKind) -> Result<UploadTicket, AppError> {
        self.issue_ticket(slot, false)
    }

    /// 提交一次上传的处理结果。
    ///
    /// 若更早的上传尚未完成，结果会暂存，直到前序全部完成后再按序写入存储。
    /// 返回本次调用实际写入（含拒绝）的上传；由其它调用触发写入的结果不会出现在这里。
    pub fn complete_upload(
        &self,
        ticket: UploadTicket,
        result: Result<FittedImage, ImageError>,
    ) -> Result<Vec<AppliedUpload>, AppError> {
        if !Arc::ptr_eq(&ticket.shared, &self.shared) {
            // 凭证随后在 Drop 中按失败提交回它自己的会话
            return Err(AppError::State(format!(
                "上传序号 #{} 不属于当前会话",
                ticket.seq
            )));
        }
        ticket.finish(result.map_err(AppError::from))
    }

    /// 同步处理一张图片并写入槽位，不阻塞等待前序上传。
    ///
    /// 已写入时返回 `Some(outcome)`；排在仍未完成的更早上传之后时返回 `None`，
    /// 结果会在前序上传提交时一并写入。
    pub fn upload(&self, slot: SlotKind, source: ImageSource) -> Result<Option<AcceptOutcome>, AppError> {
        let ticket = self.begin_upload(slot)?;
        let seq = ticket.seq;
        let spec = slot.spec();

        let result = self.processor.process(source, spec.width, spec.height);
        let applied = self.complete_upload(ticket, result)?;

        match applied.into_iter().find(|upload| upload.seq == seq) {
            Some(own) => own.outcome.map(Some),
            None => Ok(None),
        }
    }

    /// 按 UI 传入的槽位名上传。
    pub fn upload_named(
        &self,
        slot_name: &str,
        source: ImageSource,
    ) -> Result<Option<AcceptOutcome>, AppError> {
        let slot = SlotKind::from_str(slot_name)?;
        self.upload(slot, source)
    }

    /// 批量上传：在阻塞线程池上并行处理，按列表顺序写入槽位。
    ///
    /// 返回值与 `sources` 一一对应、顺序一致；单张失败不影响其它图片。
    /// 中途被取消时，已开始的任务仍会按序写入，未开始的按失败处理。
    pub async fn upload_batch(
        &self,
        slot: SlotKind,
        sources: Vec<ImageSource>,
    ) -> Result<Vec<AppliedUpload>, AppError> {
        let spec = slot.spec();
        let mut waiting = AwaitGuard {
            shared: &self.shared,
            seqs: Vec::with_capacity(sources.len()),
        };
        let mut tasks = JoinSet::new();

        for source in sources {
            let ticket = self.issue_ticket(slot, true)?;
            waiting.seqs.push(ticket.seq);

            let processor = self.processor.clone();
            tasks.spawn_blocking(move || {
                let result = processor.process(source, spec.width, spec.height);
                ticket.finish(result.map_err(AppError::from)).map(|_| ())
            });
        }

        log::info!("🚀 批量上传 {} 张到槽位 {}", waiting.seqs.len(), slot);

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(err)) => log::error!("❌ 提交批量上传结果失败：{}", err),
                Err(err) => log::error!("❌ 后台处理任务异常退出：{}", err),
            }
        }

        let mut results = Vec::with_capacity(waiting.seqs.len());
        for &seq in &waiting.seqs {
            results.push(self.wait_applied(seq).await?);
        }
        Ok(results)
    }

    async fn wait_applied(&self, seq: u64) -> Result<AppliedUpload, AppError> {
        loop {
            let notified = self.shared.notify.notified();
            let parked = self.shared.lock_state()?.finished.remove(&seq);
            if let Some(applied) = parked {
                return Ok(applied);
            }
            notified.await;
        }
    }

    /// 导出全部图片，截图槽位为空时失败。
    pub fn export_all(&self) -> Result<Vec<ExportedImage>, AppError> {
        Ok(self.shared.lock_state()?.store.export_all()?)
    }

    /// 只读访问存储。
    pub fn with_store<R>(&self, f: impl FnOnce(&CollectionStore) -> R) -> Result<R, AppError> {
        let state = self.shared.lock_state()?;
        Ok(f(&state.store))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::image_processor::test_support::png_bytes;
    use crate::store::StoreError;
    use crate::store::test_support::fitted;
    use crate::store::{SCREENSHOT, SMALL_PROMO};

    fn tags(session: &ProcessorSession, slot: SlotKind) -> Vec<u8> {
        session
            .with_store(|store| store.images(slot).iter().map(|img| img.bytes()[0]).collect())
            .expect("read store")
    }

    fn parked_results(session: &ProcessorSession) -> (usize, usize) {
        let state = session.shared.lock_state().expect("state");
        (state.awaited.len(), state.finished.len())
    }

    #[test]
    fn out_of_order_completion_is_applied_in_upload_order() {
        let session = ProcessorSession::default();
        let first = session.begin_upload(SlotKind::Screenshot).expect("ticket");
        let second = session.begin_upload(SlotKind::Screenshot).expect("ticket");

        let applied = session
            .complete_upload(second, Ok(fitted(&SCREENSHOT, 2)))
            .expect("complete second");
        assert!(applied.is_empty());
        assert!(tags(&session, SlotKind::Screenshot).is_empty());

        let applied = session
            .complete_upload(first, Ok(fitted(&SCREENSHOT, 1)))
            .expect("complete first");
        assert_eq!(applied.iter().map(|a| a.seq).collect::<Vec<_>>(), vec![0, 1]);
        assert!(matches!(applied[0].outcome, Ok(AcceptOutcome::Appended { index: 0 })));
        assert!(matches!(applied[1].outcome, Ok(AcceptOutcome::Appended { index: 1 })));
        assert_eq!(tags(&session, SlotKind::Screenshot), vec![1, 2]);
        assert_eq!(parked_results(&session), (0, 0));
    }

    #[test]
    fn failed_upload_advances_sequence_without_touching_store() {
        let session = ProcessorSession::default();
        let failing = session.begin_upload(SlotKind::SmallPromo).expect("ticket");
        let ok = session.begin_upload(SlotKind::SmallPromo).expect("ticket");

        session
            .complete_upload(ok, Ok(fitted(&SMALL_PROMO, 7)))
            .expect("complete ok");
        let applied = session
            .complete_upload(failing, Err(ImageError::Decode("broken".to_string())))
            .expect("complete failing");

        assert_eq!(applied.len(), 2);
        assert!(matches!(applied[0].outcome, Err(AppError::Image(ImageError::Decode(_)))));
        assert_eq!(tags(&session, SlotKind::SmallPromo), vec![7]);
    }

    #[test]
    fn dropped_ticket_counts_as_failed_upload() {
        let session = ProcessorSession::default();
        let abandoned = session.begin_upload(SlotKind::Screenshot).expect("ticket");
        drop(abandoned);

        let outcome = session
            .upload(SlotKind::Screenshot, ImageSource::Bytes(png_bytes(20, 10)))
            .expect("upload");

        assert_eq!(outcome, Some(AcceptOutcome::Appended { index: 0 }));
        assert_eq!(session.with_store(|s| s.len(SlotKind::Screenshot)).expect("len"), 1);
    }

    #[test]
    fn upload_behind_outstanding_ticket_is_applied_later() {
        let session = ProcessorSession::default();
        let earlier = session.begin_upload(SlotKind::Screenshot).expect("ticket");

        let outcome = session
            .upload(SlotKind::Screenshot, ImageSource::Bytes(png_bytes(20, 10)))
            .expect("upload");
        assert_eq!(outcome, None);
        assert!(tags(&session, SlotKind::Screenshot).is_empty());

        let applied = session
            .complete_upload(earlier, Ok(fitted(&SCREENSHOT, 9)))
            .expect("complete earlier");
        assert_eq!(applied.len(), 2);
        assert!(matches!(applied[1].outcome, Ok(AcceptOutcome::Appended { index: 1 })));
        assert_eq!(tags(&session, SlotKind::Screenshot)[0], 9);
    }

    #[test]
    fn ticket_from_another_session_is_rejected() {
        let session = ProcessorSession::default();
        let other = ProcessorSession::default();
        let foreign = other.begin_upload(SlotKind::Screenshot).expect("ticket");

        let result = session.complete_upload(foreign, Ok(fitted(&SCREENSHOT, 1)));
        assert!(matches!(result, Err(AppError::State(_))));

        // 被拒绝的凭证在其所属会话中按失败提交
        let outcome = other
            .upload(SlotKind::Screenshot, ImageSource::Bytes(png_bytes(20, 10)))
            .expect("upload");
        assert_eq!(outcome, Some(AcceptOutcome::Appended { index: 0 }));
        assert!(tags(&session, SlotKind::Screenshot).is_empty());
    }

    #[test]
    fn sync_upload_fits_into_slot() {
        let session = ProcessorSession::default();

        let outcome = session
            .upload(SlotKind::Screenshot, ImageSource::Bytes(png_bytes(200, 100)))
            .expect("upload");

        assert_eq!(outcome, Some(AcceptOutcome::Appended { index: 0 }));
        let dims = session
            .with_store(|store| store.images(SlotKind::Screenshot)[0].dimensions())
            .expect("read store");
        assert_eq!(dims, (1280, 800));
    }

    #[test]
    fn rejected_upload_keeps_existing_promo() {
        let session = ProcessorSession::default();
        session
            .upload_named("smallPromo", ImageSource::Bytes(png_bytes(88, 56)))
            .expect("first upload");

        let result = session.upload_named("smallPromo", ImageSource::Bytes(b"nope".to_vec()));

        assert!(matches!(result, Err(AppError::Image(ImageError::InvalidFormat(_)))));
        assert_eq!(session.with_store(|s| s.len(SlotKind::SmallPromo)).expect("len"), 1);
    }

    #[test]
    fn export_without_screenshots_fails() {
        let session = ProcessorSession::default();
        session
            .upload(SlotKind::MarqueePromo, ImageSource::Bytes(png_bytes(140, 56)))
            .expect("upload");

        assert!(matches!(
            session.export_all(),
            Err(AppError::Store(StoreError::EmptyExport))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn batch_upload_keeps_first_five_in_order() {
        let session = ProcessorSession::default();
        // 尺寸递减，越早的图片处理越慢，完成顺序往往与上传顺序相反
        let pngs: Vec<Vec<u8>> = (0..6u32)
            .map(|i| png_bytes(600 - i * 80, 300 - i * 40))
            .collect();
        let expected: Vec<_> = pngs[..5]
            .iter()
            .map(|png| {
                session
                    .processor()
                    .process(ImageSource::Bytes(png.clone()), 1280, 800)
                    .expect("reference fit")
                    .bytes()
                    .clone()
            })
            .collect();

        let sources = pngs.into_iter().map(ImageSource::Bytes).collect();
        let results = session
            .upload_batch(SlotKind::Screenshot, sources)
            .await
            .expect("batch upload");

        assert_eq!(results.len(), 6);
        let seqs: Vec<u64> = results.iter().map(|r| r.seq).collect();
        assert_eq!(seqs, (0..6).collect::<Vec<u64>>());
        assert!(matches!(results[5].outcome, Ok(AcceptOutcome::Dropped)));
        assert_eq!(parked_results(&session), (0, 0));

        let stored = session
            .with_store(|store| {
                store
                    .images(SlotKind::Screenshot)
                    .iter()
                    .map(|img| img.bytes().clone())
                    .collect::<Vec<_>>()
            })
            .expect("read store");
        assert_eq!(stored, expected);

        let exported = session.export_all().expect("export");
        assert_eq!(exported.len(), 5);
        assert_eq!(exported[4].file_name, "screenshot_5.jpg");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn cancelled_batch_does_not_stall_later_uploads() {
        let session = ProcessorSession::default();
        let sources = (0..3)
            .map(|_| ImageSource::Bytes(png_bytes(2000, 2000)))
            .collect();

        let cancelled = tokio::time::timeout(
            Duration::from_millis(1),
            session.upload_batch(SlotKind::Screenshot, sources),
        )
        .await;
        assert!(cancelled.is_err(), "batch should still be running after 1ms");

        let follow_up = tokio::time::timeout(
            Duration::from_secs(60),
            session.upload_batch(
                SlotKind::SmallPromo,
                vec![ImageSource::Bytes(png_bytes(88, 56))],
            ),
        )
        .await
        .expect("queue must drain after cancellation")
        .expect("follow-up batch");

        assert_eq!(follow_up.len(), 1);
        assert_eq!(follow_up[0].seq, 3);
        assert!(matches!(
            follow_up[0].outcome,
            Ok(AcceptOutcome::Replaced { previous: false })
        ));
        assert!(session.with_store(|s| s.len(SlotKind::Screenshot)).expect("len") <= 3);
        assert_eq!(parked_results(&session), (0, 0));
    }
}

use std::{
    pin::Pin,
    task::{Context, Poll},
};

use futures::{
    channel::mpsc::{self, UnboundedReceiver, UnboundedSender},
    stream::FusedStream,
    Stream, StreamExt,
};

use crate::{Observer, ProgressClock, Subscription};

/// A progress ramp consumed as a [`Stream`].
///
/// Nothing happens until the stream is first polled. Dropping the stream
/// before it ends cancels the session.
#[derive(Debug)]
pub struct ProgressStream {
    state: State,
}

#[derive(Debug)]
enum State {
    /// Not polled yet.
    Idle(ProgressClock),
    Running {
        receiver: UnboundedReceiver<f64>,
        /// Kept alive so the session runs for as long as the stream does.
        _subscription: Subscription,
    },
    Done,
}

impl ProgressStream {
    /// `clock` must have a validated duration.
    pub(crate) fn new(clock: ProgressClock) -> Self {
        Self {
            state: State::Idle(clock),
        }
    }
}

/// Forwards session values into the stream's channel.
struct ChannelObserver {
    sender: UnboundedSender<f64>,
}

impl Observer for ChannelObserver {
    fn on_progress(&mut self, progress: f64) {
        // The receiver is gone only when the stream was dropped,
        // which cancels the session.
        let _ = self.sender.unbounded_send(progress);
    }

    fn on_complete(&mut self) {
        self.sender.close_channel();
    }
}

impl Stream for ProgressStream {
    type Item = f64;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        if let State::Idle(clock) = &this.state {
            let (sender, receiver) = mpsc::unbounded();
            let subscription = clock.start(Box::new(ChannelObserver { sender }));
            this.state = State::Running {
                receiver,
                _subscription: subscription,
            };
        }

        let State::Running { receiver, .. } = &mut this.state else {
            return Poll::Ready(None);
        };

        match receiver.poll_next_unpin(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Some(progress)) => Poll::Ready(Some(progress)),
            Poll::Ready(None) => {
                this.state = State::Done;
                Poll::Ready(None)
            }
        }
    }
}

impl FusedStream for ProgressStream {
    fn is_terminated(&self) -> bool {
        matches!(self.state, State::Done)
    }
}

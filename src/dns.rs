//! Waiting for a DNS response.
//!
//! A [`DnsQuery`] is created by the owner of a socket right after it has
//! sent a query. Each poll makes one non-blocking attempt at receiving the
//! response through a [`ResponseParser`]. Once a response is there, the
//! task finishes with the parsed [`Message`] and the status reported by
//! the parser, i.e., the number of octets received.
//!
//! If the parser reports a failure, such as a malformed frame or a closed
//! connection, the task fails with the parser's status. It does not retry;
//! an owner wanting to retry creates a new task.

use crate::socket::TaskOwner;
use crate::task::{
    AsyncTask, Completion, Progress, Status, TaskCore, TaskEnv,
};
use crate::wire::{
    Framing, Message, Name, Received, ResponseParser, Rtype, WireParser,
};
use std::sync::{Arc, Weak};
use tracing::{debug, trace};

/// The log target for DNS tasks.
const LOG_TARGET: &str = "polltask::dns";

//------------ DnsQuery -------------------------------------------------------

/// A task waiting for the response to a DNS query.
#[derive(Debug)]
pub struct DnsQuery<O, P = WireParser> {
    core: TaskCore<Message>,
    owner: Weak<O>,
    parser: P,
    expect_id: Option<u16>,
    expect_question: Option<(Name, Rtype)>,
}

impl<O: TaskOwner> DnsQuery<O> {
    /// Creates a new task reading from the socket of `owner`.
    ///
    /// The task uses a [`WireParser`] with the given framing and the
    /// receive limits of the environment's configuration.
    pub fn new(
        env: &TaskEnv,
        owner: &Arc<O>,
        framing: Framing,
        completion: Completion<Message>,
    ) -> Self {
        Self::with_parser(
            env,
            Arc::downgrade(owner),
            WireParser::new(framing, env.config()),
            completion,
        )
    }
}

impl<O, P> DnsQuery<O, P> {
    /// Creates a new task using the given parser.
    pub fn with_parser(
        env: &TaskEnv,
        owner: Weak<O>,
        parser: P,
        completion: Completion<Message>,
    ) -> Self {
        let core = TaskCore::new(env, "dns", completion);
        trace!(target: LOG_TARGET, task = %core.id(), "created request");
        DnsQuery {
            core,
            owner,
            parser,
            expect_id: None,
            expect_question: None,
        }
    }

    /// Only accepts responses with the given message ID.
    ///
    /// Responses with a different ID are dropped and the task keeps
    /// waiting.
    pub fn expect_id(mut self, id: u16) -> Self {
        self.expect_id = Some(id);
        self
    }

    /// Only accepts responses to a question for `qname` and `qtype`.
    ///
    /// Like responses with a foreign ID, responses whose first question
    /// differs are dropped.
    pub fn expect_question(mut self, qname: Name, qtype: Rtype) -> Self {
        self.expect_question = Some((qname, qtype));
        self
    }

    /// Returns whether `msg` answers the query this task waits for.
    fn is_answer(&self, msg: &Message) -> bool {
        if let Some(id) = self.expect_id {
            if msg.header().id() != id {
                return false;
            }
        }
        match (&self.expect_question, msg.first_question()) {
            (None, _) => true,
            (Some((qname, qtype)), Some(question)) => {
                question.qname() == qname && question.qtype() == *qtype
            }
            (Some(_), None) => false,
        }
    }

    /// Returns the owner of the task.
    pub fn owner(&self) -> &Weak<O> {
        &self.owner
    }

    /// Returns the parser.
    pub fn parser(&self) -> &P {
        &self.parser
    }
}

impl<O, P> AsyncTask for DnsQuery<O, P>
where
    O: TaskOwner,
    P: ResponseParser<Response = Message>,
{
    type Output = Message;

    fn core(&self) -> &TaskCore<Message> {
        &self.core
    }

    fn core_mut(&mut self) -> &mut TaskCore<Message> {
        &mut self.core
    }

    fn step(&mut self) -> Progress<Message> {
        let id = self.core.id();
        let owner = match self.owner.upgrade() {
            Some(owner) => owner,
            None => {
                debug!(target: LOG_TARGET, task = %id, "owner gone");
                return Progress::Failed(Status::OWNER_GONE);
            }
        };
        match self.parser.attempt_receive(owner.socket()) {
            Received::Pending => {
                trace!(target: LOG_TARGET, task = %id, "running request");
                Progress::Pending
            }
            Received::Response(msg, status) => {
                if !self.is_answer(&msg) {
                    debug!(
                        target: LOG_TARGET,
                        task = %id,
                        "ignoring response with id {} that is not an answer",
                        msg.header().id()
                    );
                    return Progress::Pending;
                }
                match msg.first_question() {
                    Some(question) => debug!(
                        target: LOG_TARGET,
                        task = %id,
                        "finished request for {}",
                        question.qname()
                    ),
                    None => debug!(
                        target: LOG_TARGET,
                        task = %id,
                        "finished request without question"
                    ),
                }
                Progress::Ready(msg, status)
            }
            Received::Failed(status) => {
                debug!(
                    target: LOG_TARGET,
                    task = %id,
                    "request failed: {}",
                    status
                );
                Progress::Failed(status)
            }
        }
    }
}

//============ Tests =========================================================

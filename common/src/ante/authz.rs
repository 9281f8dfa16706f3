use super::{AnteContext, AnteDecorator, AnteError};
use crate::{
    config::{DISABLED_AUTHZ_MSGS, MAX_NESTED_MSGS},
    transaction::{Msg, Transaction},
};

/// Forbids executing or granting the disabled message types through
/// authz, and bounds how deep `MsgExec` wrappers can be nested.
///
/// The nesting level is shared by sibling `MsgExec`, so a flat list of
/// many of them counts like a deep chain. A level reached inside one
/// `MsgExec` does not carry over to its siblings.
pub struct AuthzLimiterDecorator {
    disabled_msgs: Vec<String>,
}

impl Default for AuthzLimiterDecorator {
    fn default() -> Self {
        Self::new(DISABLED_AUTHZ_MSGS.iter().map(|url| url.to_string()).collect())
    }
}

impl AuthzLimiterDecorator {
    pub fn new(disabled_msgs: Vec<String>) -> Self {
        Self { disabled_msgs }
    }

    fn is_disabled_msg(&self, type_url: &str) -> bool {
        self.disabled_msgs.iter().any(|url| url == type_url)
    }

    fn check_disabled_msgs(
        &self,
        msgs: &[Msg],
        is_authz_inner_msg: bool,
        mut nested_level: usize,
    ) -> Result<(), String> {
        if nested_level >= MAX_NESTED_MSGS {
            return Err(format!(
                "found more nested msgs than permitted. Limit is : {}",
                MAX_NESTED_MSGS
            ));
        }

        for msg in msgs {
            match msg {
                Msg::Exec(exec) => {
                    nested_level += 1;
                    self.check_disabled_msgs(&exec.msgs, true, nested_level)?;
                }
                Msg::Grant(grant) => {
                    let url = grant.authorization.msg_type_url();
                    if self.is_disabled_msg(url) {
                        return Err(format!("found disabled msg type: {}", url));
                    }
                }
                msg => {
                    let url = msg.type_url();
                    if is_authz_inner_msg && self.is_disabled_msg(url) {
                        return Err(format!("found disabled msg type: {}", url));
                    }
                }
            }
        }

        Ok(())
    }
}

impl<S: ?Sized, E> AnteDecorator<S, E> for AuthzLimiterDecorator {
    fn name(&self) -> &'static str {
        "authz_limiter"
    }

    fn ante_handle(
        &self,
        ctx: AnteContext,
        _: &mut S,
        tx: &Transaction,
        _: bool,
    ) -> Result<AnteContext, AnteError<E>> {
        self.check_disabled_msgs(&tx.msgs, false, 0)
            .map_err(AnteError::Unauthorized)?;
        Ok(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ante::{ErrorKind, ExecMode},
        coin::{Coin, Coins},
        config::{MSG_CREATE_VESTING_ACCOUNT_TYPE_URL, MSG_ETHEREUM_TX_TYPE_URL, MSG_SEND_TYPE_URL},
        crypto::Address,
        transaction::{Authorization, Fee, MsgCreateVestingAccount, MsgExec, MsgGrant, MsgSend},
    };

    fn send() -> Msg {
        Msg::Send(MsgSend {
            from_address: Address::new([1; 20]),
            to_address: Address::new([2; 20]),
            amount: Coins::from(Coin::new("azena", 1u64)),
        })
    }

    fn vesting() -> Msg {
        Msg::CreateVestingAccount(MsgCreateVestingAccount {
            from_address: Address::new([1; 20]),
            to_address: Address::new([2; 20]),
            amount: Coins::from(Coin::new("azena", 1u64)),
            end_time: 100,
        })
    }

    fn exec(msgs: Vec<Msg>) -> Msg {
        Msg::Exec(MsgExec {
            grantee: Address::new([3; 20]),
            msgs,
        })
    }

    fn grant(authorization: Authorization) -> Msg {
        Msg::Grant(MsgGrant {
            granter: Address::new([1; 20]),
            grantee: Address::new([3; 20]),
            authorization,
            expiration: None,
        })
    }

    fn nested_exec(depth: usize, inner: Vec<Msg>) -> Msg {
        let mut msg = exec(inner);
        for _ in 1..depth {
            msg = exec(vec![msg]);
        }
        msg
    }

    fn check(msgs: Vec<Msg>) -> Result<AnteContext, AnteError<String>> {
        let tx = Transaction::new(msgs, Fee::default());
        AnteDecorator::<(), String>::ante_handle(
            &AuthzLimiterDecorator::default(),
            AnteContext::new(1, 0, ExecMode::Deliver),
            &mut (),
            &tx,
            false,
        )
    }

    #[test]
    fn test_enabled_msgs() {
        check(vec![send()]).unwrap();
        check(vec![exec(vec![send()])]).unwrap();
        check(vec![grant(Authorization::Send {
            spend_limit: Coins::from(Coin::new("azena", 10u64)),
        })])
        .unwrap();
        check(vec![grant(Authorization::Generic {
            msg: MSG_SEND_TYPE_URL.to_string(),
        })])
        .unwrap();
    }

    #[test]
    fn test_vesting_outside_authz_allowed() {
        check(vec![vesting()]).unwrap();
    }

    #[test]
    fn test_disabled_msg_in_exec() {
        let err = check(vec![exec(vec![send(), vesting()])]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        assert_eq!(
            err.to_string(),
            format!(
                "found disabled msg type: {}: unauthorized",
                MSG_CREATE_VESTING_ACCOUNT_TYPE_URL
            )
        );
    }

    #[test]
    fn test_disabled_grant() {
        let err = check(vec![grant(Authorization::Generic {
            msg: MSG_ETHEREUM_TX_TYPE_URL.to_string(),
        })])
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);

        // Grant wrapped in an exec
        let err = check(vec![exec(vec![grant(Authorization::Generic {
            msg: MSG_CREATE_VESTING_ACCOUNT_TYPE_URL.to_string(),
        })])])
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
    }

    #[test]
    fn test_deeply_nested_disabled_msg() {
        let err = check(vec![nested_exec(5, vec![vesting()])]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
    }

    #[test]
    fn test_nesting_limit() {
        check(vec![nested_exec(MAX_NESTED_MSGS - 1, vec![send()])]).unwrap();

        let err = check(vec![nested_exec(MAX_NESTED_MSGS, vec![send()])]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        assert!(err.to_string().starts_with("found more nested msgs than permitted"));
    }

    #[test]
    fn test_sibling_execs_share_nesting_level() {
        let siblings = (0..MAX_NESTED_MSGS).map(|_| exec(vec![send()])).collect();
        let err = check(siblings).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
    }
}

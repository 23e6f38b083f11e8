//! An in-memory stand-in for the remote coordination service.
//!
//! The mock plays the operating service's side of both protocols with the
//! bundled crypto providers, so coordinators can be driven end to end
//! without a network.
#![allow(dead_code)]

use async_trait::async_trait;
use rand::{rngs::StdRng, SeedableRng};
use std::{collections::HashMap, sync::Mutex};
use tss_wallet::{
    constants::{SHARE_COMPONENT_LENGTH, THRESHOLD, TOTAL_SHARES, TSS_KEY_TYPE},
    crypto::{
        EciesShareTransport, Ed25519ShareCrypto, ShareCrypto, ShareTransportCrypto,
        TransportKeyPair,
    },
    types::{
        intent::IntentRequest,
        key_share::{PShare, YShare},
        keychain::{CreateKeychainParams, Keychain, KeychainShare},
        party::{Direction, PartyIndex, Role},
        signing::{GShare, RShare, SignShare, Signature},
        tx_request::{
            SignatureShareRecord, TxRequest, TxRequestId, TxRequestList, UnsignedTx, WalletId,
        },
        SecretString,
    },
};
use tss_wallet_client::{
    remote::{Constants, TssConstants},
    RemoteCoordinationClient, TransportError,
};

pub const COIN: &str = "tsol";
pub const WALLET_ID: &str = "5b34252f1bf349930e34020a00000000";
pub const PASSPHRASE: &str = "test passphrase";

/// A user private share from a fixed key generation, usable without running
/// the ceremony.
pub const VALID_USER_P_SHARE: &str = r#"{"i":"1","t":2,"n":3,"y":"c4f36234dbcb78ba7efee44771692a71f1d366c70b99656922168590a63c96c2","x":"5d462225ce32327c1ad0c9b1c2263bdbdb154236fb4b3445f199f05b135d010b","prefix":"77e5611f781363b4e303bbe20bed8c62028d88ba22b47af9e77e6b134c373009"}"#;

/// Calls made against the mock, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    GetConstants,
    CreateKey(Role),
    GetTxRequests(TxRequestId),
    PostSignatureShare(SignatureShareRecord),
    PostTxRequestCreate(IntentRequest),
    PostTxSend(TxRequestId),
}

/// Operations whose failure can be injected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    GetConstants,
    CreateKey,
    GetTxRequests,
    PostSignatureShare,
    PostTxRequestCreate,
    PostTxSend,
}

/// The service's signing session for one transaction request.
struct Session {
    sign_share: SignShare,
    user_r_share: RShare,
}

#[derive(Default)]
struct State {
    calls: Vec<Call>,
    key_params: Vec<CreateKeychainParams>,
    failures: HashMap<Operation, (u16, String)>,
    /// Set once the service has taken part in a key generation ceremony.
    bitgo_p_share: Option<PShare>,
    tx_requests: HashMap<TxRequestId, TxRequest>,
    sessions: HashMap<TxRequestId, Session>,
    signatures: HashMap<TxRequestId, Signature>,
    omit_bitgo_reply: bool,
}

pub struct MockBitgoService {
    transport_key: TransportKeyPair,
    /// Signs for the service when no ceremony ran, so replies stay well formed.
    stand_in_p_share: PShare,
    rng: Mutex<StdRng>,
    state: Mutex<State>,
}

impl MockBitgoService {
    pub fn new(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let transport_key = EciesShareTransport.generate_key_pair(&mut rng);
        let stand_in = Ed25519ShareCrypto
            .key_share(&mut rng, PartyIndex::BITGO, THRESHOLD, TOTAL_SHARES)
            .expect("bitgo key share");
        let stand_in_p_share = PShare {
            i: PartyIndex::BITGO,
            t: THRESHOLD,
            n: TOTAL_SHARES,
            y: stand_in.u_share.y.clone(),
            x: stand_in.u_share.x.clone(),
            prefix: stand_in.u_share.prefix.clone(),
        };

        Self {
            transport_key,
            stand_in_p_share,
            rng: Mutex::new(rng),
            state: Mutex::new(State::default()),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Bodies of every create-keychain call, in order.
    pub fn key_params(&self) -> Vec<CreateKeychainParams> {
        self.state.lock().unwrap().key_params.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    /// Make every later call to `operation` fail with `status`.
    pub fn fail(&self, operation: Operation, status: u16, message: &str) {
        let _ = self
            .state
            .lock()
            .unwrap()
            .failures
            .insert(operation, (status, message.to_string()));
    }

    /// Accept user offers without posting the service's reply.
    pub fn omit_bitgo_reply(&self) {
        self.state.lock().unwrap().omit_bitgo_reply = true;
    }

    pub fn insert_tx_request(&self, tx_request: TxRequest) {
        let _ = self
            .state
            .lock()
            .unwrap()
            .tx_requests
            .insert(tx_request.tx_request_id.clone(), tx_request);
    }

    pub fn tx_request(&self, id: &TxRequestId) -> Option<TxRequest> {
        self.state.lock().unwrap().tx_requests.get(id).cloned()
    }

    /// The combined signature the service verified for `id`, if any.
    pub fn signature(&self, id: &TxRequestId) -> Option<Signature> {
        self.state.lock().unwrap().signatures.get(id).cloned()
    }

    fn record(&self, operation: Operation, call: Call) -> Result<(), TransportError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        match state.failures.get(&operation) {
            Some((status, message)) => Err(TransportError::Status {
                status: *status,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }

    fn create_bitgo_keychain(&self, params: &CreateKeychainParams) -> Keychain {
        let crypto = Ed25519ShareCrypto;
        let transport = EciesShareTransport;
        let mut rng = self.rng.lock().unwrap();

        let bitgo_key_share = crypto
            .key_share(&mut *rng, PartyIndex::BITGO, THRESHOLD, TOTAL_SHARES)
            .expect("bitgo key share");

        let peer_components: Vec<YShare> = params
            .key_shares
            .iter()
            .filter(|share| share.to == Role::Bitgo)
            .map(|share| {
                let u = transport
                    .decrypt(&share.private_share, &self.transport_key)
                    .expect("share encrypted for bitgo");
                YShare {
                    i: share.from.index(),
                    j: PartyIndex::BITGO,
                    y: share.public_share.clone(),
                    u: SecretString::new(String::from_utf8(u).expect("hex share")),
                }
            })
            .collect();
        let combined = crypto
            .key_combine(&bitgo_key_share.u_share, &peer_components)
            .expect("combine bitgo key");

        let key_shares = [
            (Role::User, params.user_gpg_public_key.as_deref()),
            (Role::Backup, params.backup_gpg_public_key.as_deref()),
        ]
        .into_iter()
        .map(|(to, armored)| {
            let public_key = transport
                .parse_public_key(armored.expect("transport public key"))
                .expect("valid transport public key");
            let y_share = bitgo_key_share
                .y_share_for(to.index())
                .expect("bitgo component");
            KeychainShare {
                from: Role::Bitgo,
                to,
                public_share: y_share.y.clone(),
                private_share: transport
                    .encrypt(&mut *rng, y_share.u.expose().as_bytes(), &public_key)
                    .expect("encrypt bitgo component"),
            }
        })
        .collect();

        let common_pub = combined.common_pub().to_string();
        self.state.lock().unwrap().bitgo_p_share = Some(combined.p_share);

        Keychain {
            id: "bitgo-keychain".to_string(),
            public_key: common_pub.clone(),
            common_pub: Some(common_pub),
            key_shares,
            key_type: Some(TSS_KEY_TYPE.to_string()),
            source: Some(Role::Bitgo),
            ..Keychain::default()
        }
    }

    fn signable(&self, id: &TxRequestId) -> Vec<u8> {
        let state = self.state.lock().unwrap();
        let tx_request = state.tx_requests.get(id).expect("known tx request");
        hex::decode(&tx_request.unsigned_txs[0].signable_hex).expect("signable hex")
    }

    /// Answer the user's `r ++ R` offer with the service's own `r ++ R`.
    fn answer_offer(&self, id: &TxRequestId, share: &[u8]) -> SignatureShareRecord {
        let (r, r_commitment) = share.split_at(SHARE_COMPONENT_LENGTH);
        let user_r_share = RShare {
            i: PartyIndex::USER,
            j: PartyIndex::BITGO,
            r: SecretString::new(hex::encode(r)),
            r_commitment: hex::encode(r_commitment),
        };

        let signable = self.signable(id);
        let p_share = self
            .state
            .lock()
            .unwrap()
            .bitgo_p_share
            .clone()
            .unwrap_or_else(|| self.stand_in_p_share.clone());
        let sign_share = Ed25519ShareCrypto
            .sign_share(
                &mut *self.rng.lock().unwrap(),
                &signable,
                &p_share,
                &[PartyIndex::USER, PartyIndex::BITGO],
            )
            .expect("bitgo sign share");

        let bitgo_to_user = &sign_share.r_shares[&PartyIndex::USER];
        let reply = SignatureShareRecord::new(
            Direction::BitgoToUser,
            format!("{}{}", bitgo_to_user.r.expose(), bitgo_to_user.r_commitment),
        );

        let mut state = self.state.lock().unwrap();
        let _ = state.sessions.insert(
            id.clone(),
            Session {
                sign_share,
                user_r_share,
            },
        );
        reply
    }

    /// Combine the user's `R ++ gamma` with the service's partial signature
    /// and keep the result if it verifies.
    fn complete_signature(&self, id: &TxRequestId, share: &[u8]) {
        let signable = self.signable(id);
        let mut state = self.state.lock().unwrap();
        let Some(session) = state.sessions.remove(id) else {
            return;
        };
        if state.bitgo_p_share.is_none() {
            return;
        }

        let crypto = Ed25519ShareCrypto;
        let (r_commitment, gamma) = share.split_at(SHARE_COMPONENT_LENGTH);
        let user_g_share = GShare {
            i: PartyIndex::USER,
            y: session.sign_share.x_share.y.clone(),
            gamma: hex::encode(gamma),
            r_commitment: hex::encode(r_commitment),
        };
        let bitgo_g_share = crypto
            .sign(
                &signable,
                &session.sign_share.x_share,
                &[session.user_r_share],
            )
            .expect("bitgo g share");

        if let Ok(signature) = crypto.sign_combine(&[user_g_share, bitgo_g_share]) {
            if crypto.verify(&signable, &signature).is_ok() {
                let _ = state.signatures.insert(id.clone(), signature);
            }
        }
    }
}

#[async_trait]
impl RemoteCoordinationClient for MockBitgoService {
    async fn get_constants(&self) -> Result<Constants, TransportError> {
        self.record(Operation::GetConstants, Call::GetConstants)?;
        Ok(Constants {
            tss: TssConstants {
                bitgo_public_key: self.transport_key.public_key().to_armored(),
            },
        })
    }

    async fn create_key(
        &self,
        coin: &str,
        params: &CreateKeychainParams,
    ) -> Result<Keychain, TransportError> {
        self.record(Operation::CreateKey, Call::CreateKey(params.source))?;
        self.state.lock().unwrap().key_params.push(params.clone());
        assert_eq!(coin, COIN);

        if params.source == Role::Bitgo {
            return Ok(self.create_bitgo_keychain(params));
        }

        Ok(Keychain {
            id: format!("{}-keychain", params.source),
            public_key: params.common_pub.clone().unwrap_or_default(),
            common_pub: params.common_pub.clone(),
            key_type: Some(params.key_type.clone()),
            source: Some(params.source),
            encrypted_prv: params.encrypted_prv.clone(),
            ..Keychain::default()
        })
    }

    async fn get_tx_requests(
        &self,
        wallet_id: &WalletId,
        tx_request_id: &TxRequestId,
        latest: bool,
    ) -> Result<TxRequestList, TransportError> {
        self.record(
            Operation::GetTxRequests,
            Call::GetTxRequests(tx_request_id.clone()),
        )?;
        assert_eq!(wallet_id.as_str(), WALLET_ID);
        assert!(latest);

        let tx_requests = self.tx_request(tx_request_id).into_iter().collect();
        Ok(TxRequestList { tx_requests })
    }

    async fn post_signature_share(
        &self,
        wallet_id: &WalletId,
        tx_request_id: &TxRequestId,
        record: &SignatureShareRecord,
    ) -> Result<SignatureShareRecord, TransportError> {
        self.record(
            Operation::PostSignatureShare,
            Call::PostSignatureShare(record.clone()),
        )?;
        assert_eq!(wallet_id.as_str(), WALLET_ID);

        let share = hex::decode(&record.share).map_err(|_| TransportError::Status {
            status: 400,
            message: "share is not hex".to_string(),
        })?;
        let is_offer = !self
            .state
            .lock()
            .unwrap()
            .sessions
            .contains_key(tx_request_id);

        let reply = if share.len() != 2 * SHARE_COMPONENT_LENGTH {
            None
        } else if is_offer {
            Some(self.answer_offer(tx_request_id, &share))
        } else {
            self.complete_signature(tx_request_id, &share);
            None
        };

        let mut state = self.state.lock().unwrap();
        let omit_reply = state.omit_bitgo_reply;
        let tx_request = state
            .tx_requests
            .get_mut(tx_request_id)
            .ok_or_else(|| TransportError::Status {
                status: 404,
                message: format!("TxRequest {tx_request_id} not found"),
            })?;
        tx_request.signature_shares.push(record.clone());
        if let Some(reply) = reply.filter(|_| !omit_reply) {
            tx_request.signature_shares.push(reply);
        }

        Ok(record.clone())
    }

    async fn post_tx_request_create(
        &self,
        wallet_id: &WalletId,
        intent: &IntentRequest,
    ) -> Result<TxRequest, TransportError> {
        self.record(
            Operation::PostTxRequestCreate,
            Call::PostTxRequestCreate(intent.clone()),
        )?;
        assert_eq!(wallet_id.as_str(), WALLET_ID);

        let tx_request = tx_request("prebuilt", "deadbeef");
        self.insert_tx_request(tx_request.clone());
        Ok(tx_request)
    }

    async fn post_tx_send(
        &self,
        coin: &str,
        wallet_id: &WalletId,
        tx_request_id: &TxRequestId,
    ) -> Result<(), TransportError> {
        self.record(Operation::PostTxSend, Call::PostTxSend(tx_request_id.clone()))?;
        assert_eq!(coin, COIN);
        assert_eq!(wallet_id.as_str(), WALLET_ID);
        Ok(())
    }
}

pub fn tx_request(id: &str, signable_hex: &str) -> TxRequest {
    TxRequest {
        tx_request_id: TxRequestId::from(id),
        unsigned_txs: vec![UnsignedTx {
            signable_hex: signable_hex.to_string(),
            serialized_tx_hex: "ababfefe".to_string(),
        }],
        signature_shares: Vec::new(),
    }
}

pub fn valid_user_p_share() -> PShare {
    VALID_USER_P_SHARE.parse().expect("valid user p share")
}

pub fn wallet_id() -> WalletId {
    WalletId::from(WALLET_ID)
}
